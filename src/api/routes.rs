use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::actors::LiveOrders;
use crate::domain::order::{Marketplace, NewOrder, Order, OrderId, OrderStats, OrderStatus};
use crate::health::{HealthStatus, SystemHealth};
use crate::metrics::Metrics;
use crate::store::{InMemorySource, MutationOutcome, OrderStore, RefreshOutcome};
use crate::views::ViewBoard;

use super::errors::ApiError;

// ============================================================================
// Shared State
// ============================================================================

pub struct AppState {
    pub store: OrderStore,
    pub live: LiveOrders,
    pub views: Mutex<ViewBoard>,
    /// Present only when orders are held in-process
    pub ingest: Option<Arc<InMemorySource>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        live: LiveOrders,
        ingest: Option<Arc<InMemorySource>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store: live.store().clone(),
            live,
            views: Mutex::new(ViewBoard::new()),
            ingest,
            metrics,
        }
    }

    fn views(&self) -> MutexGuard<'_, ViewBoard> {
        self.views.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

type State = web::Data<AppState>;

// ============================================================================
// Request / Response Bodies
// ============================================================================

pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const MAX_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub marketplace: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl OrderQuery {
    /// `(skip, limit)` applied after filtering
    fn page(&self) -> Result<(usize, usize), ApiError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {}, got {}",
                MAX_PAGE_LIMIT, limit
            )));
        }
        Ok((self.skip.unwrap_or(0), limit))
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionUpdate {
    pub order_id: OrderId,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityUpdate {
    pub visible: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrdersResponse {
    orders: Vec<Order>,
    loading: bool,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MutationResponse {
    order: Option<Order>,
    changed: bool,
    error: Option<String>,
}

fn parse_status(raw: &str) -> Result<OrderStatus, ApiError> {
    raw.parse().map_err(ApiError::BadRequest)
}

fn mutation_response(store: &OrderStore, id: &OrderId, outcome: MutationOutcome) -> Result<HttpResponse, ApiError> {
    if outcome == MutationOutcome::NotFound {
        return Err(ApiError::NotFound(id.clone()));
    }

    let state = store.snapshot();
    Ok(HttpResponse::Ok().json(MutationResponse {
        order: state.find(id).cloned(),
        changed: matches!(outcome, MutationOutcome::Applied { .. }),
        error: state.error().map(str::to_string),
    }))
}

// ============================================================================
// Service Endpoints
// ============================================================================

pub async fn health(state: State) -> HttpResponse {
    let report = SystemHealth::assess(vec![state.store.health(), state.store.source().health()]);

    match report.overall_status {
        HealthStatus::Unhealthy(_) => HttpResponse::ServiceUnavailable().json(report),
        _ => HttpResponse::Ok().json(report),
    }
}

pub async fn metrics(state: State) -> Result<HttpResponse, ApiError> {
    let body = state.metrics.encode()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

// ============================================================================
// Order Endpoints
// ============================================================================

pub async fn list_orders(state: State, query: web::Query<OrderQuery>) -> Result<HttpResponse, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let marketplace = query
        .marketplace
        .as_deref()
        .map(|m| m.parse::<Marketplace>().map_err(ApiError::BadRequest))
        .transpose()?;
    let (skip, limit) = query.page()?;

    let snapshot = state.store.snapshot();
    let orders = snapshot
        .orders()
        .iter()
        .filter(|o| status.map_or(true, |s| o.status == s))
        .filter(|o| marketplace.map_or(true, |m| o.marketplace == m))
        .skip(skip)
        .take(limit)
        .cloned()
        .collect();

    Ok(HttpResponse::Ok().json(OrdersResponse {
        orders,
        loading: snapshot.loading(),
        error: snapshot.error().map(str::to_string),
    }))
}

pub async fn order_stats(state: State) -> HttpResponse {
    let snapshot = state.store.snapshot();
    HttpResponse::Ok().json(OrderStats::from_orders(snapshot.orders()))
}

pub async fn get_order(state: State, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = OrderId::new(path.into_inner());
    let snapshot = state.store.snapshot();
    let order = snapshot.find(&id).ok_or(ApiError::NotFound(id.clone()))?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn create_order(state: State, body: web::Json<NewOrder>) -> Result<HttpResponse, ApiError> {
    let source = state
        .ingest
        .as_ref()
        .ok_or_else(|| ApiError::Conflict("orders are ingested by the remote order API".to_string()))?;

    let order = source.ingest(body.into_inner())?;
    state.store.refresh().await;

    Ok(HttpResponse::Created().json(order))
}

pub async fn update_status(
    state: State,
    path: web::Path<String>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let id = OrderId::new(path.into_inner());
    let outcome = state.store.update_order_status(&id, body.status).await?;
    mutation_response(&state.store, &id, outcome)
}

pub async fn accept_order(state: State, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = OrderId::new(path.into_inner());
    let outcome = state.store.accept_order(&id).await?;
    mutation_response(&state.store, &id, outcome)
}

pub async fn cancel_order(state: State, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = OrderId::new(path.into_inner());
    let outcome = state.store.cancel_order(&id).await?;
    mutation_response(&state.store, &id, outcome)
}

pub async fn refresh(state: State) -> HttpResponse {
    let outcome = state.store.refresh().await;
    let snapshot = state.store.snapshot();

    let (label, count) = match outcome {
        RefreshOutcome::Applied { count } => ("applied", Some(count)),
        RefreshOutcome::Discarded => ("discarded", None),
        RefreshOutcome::Failed(_) => ("failed", None),
    };

    HttpResponse::Ok().json(serde_json::json!({
        "outcome": label,
        "count": count,
        "loading": snapshot.loading(),
        "error": snapshot.error(),
    }))
}

// ============================================================================
// View Endpoints
// ============================================================================

pub async fn get_view(state: State, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let status = parse_status(&path)?;
    let snapshot = state.store.snapshot();

    let page = state
        .views()
        .page(status, snapshot.orders())
        .ok_or_else(|| ApiError::BadRequest(format!("no view for {}", status)))?;

    Ok(HttpResponse::Ok().json(page))
}

pub async fn select_in_view(
    state: State,
    path: web::Path<String>,
    body: web::Json<SelectionUpdate>,
) -> Result<HttpResponse, ApiError> {
    let status = parse_status(&path)?;
    let snapshot = state.store.snapshot();

    if !state.views().select(status, &body.order_id, snapshot.orders()) {
        return Err(ApiError::NotFound(body.order_id.clone()));
    }

    Ok(HttpResponse::NoContent().finish())
}

pub async fn advance_in_view(
    state: State,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (status, id) = path.into_inner();
    let status = parse_status(&status)?;
    let id = OrderId::new(id);

    let view = state
        .views()
        .view(status)
        .cloned()
        .ok_or_else(|| ApiError::BadRequest(format!("no view for {}", status)))?;

    let outcome = view.perform(&state.store, &id).await?;
    mutation_response(&state.store, &id, outcome)
}

pub async fn visibility(state: State, body: web::Json<VisibilityUpdate>) -> HttpResponse {
    let refreshed = state.live.visibility_changed(body.visible);
    HttpResponse::Ok().json(serde_json::json!({ "refreshed": refreshed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::server::configure;
    use crate::domain::order::{fixtures, TransitionPolicy};
    use actix_web::{http::StatusCode, test, App};

    fn app_state(policy: TransitionPolicy) -> web::Data<AppState> {
        let source = Arc::new(InMemorySource::seeded());
        let store = OrderStore::new(source.clone(), policy).with_orders(fixtures::seed_orders());
        let live = LiveOrders::new(store, 0);
        let metrics = Arc::new(Metrics::new().unwrap());
        web::Data::new(AppState::new(live, Some(source), metrics))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn test_list_orders_with_filters() {
        let state = app_state(TransitionPolicy::Permissive);
        let app = app!(state);

        let req = test::TestRequest::get().uri("/orders?status=confirmed").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["orders"].as_array().unwrap().len(), 2);
        assert_eq!(body["loading"], false);

        let req = test::TestRequest::get()
            .uri("/orders?status=confirmed&marketplace=ifood")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["orders"][0]["id"], "2");

        let req = test::TestRequest::get().uri("/orders?status=lost").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_list_orders_pages_after_filtering() {
        let state = app_state(TransitionPolicy::Permissive);
        let app = app!(state);

        let req = test::TestRequest::get().uri("/orders?skip=1&limit=2").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let ids: Vec<_> = body["orders"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["2", "3"]);

        let req = test::TestRequest::get().uri("/orders?status=confirmed&skip=1").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["orders"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/orders?skip=50").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["orders"].as_array().unwrap().is_empty());

        for uri in ["/orders?limit=0", "/orders?limit=1001", "/orders?skip=-1"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_get_order_and_stats() {
        let state = app_state(TransitionPolicy::Permissive);
        let app = app!(state);

        let req = test::TestRequest::get().uri("/orders/stats").to_request();
        let stats: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["totalOrders"], 7);

        let req = test::TestRequest::get().uri("/orders/3").to_request();
        let order: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(order["status"], "preparing");

        let req = test::TestRequest::get().uri("/orders/missing").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_status_endpoints() {
        let state = app_state(TransitionPolicy::Enforced);
        let app = app!(state);

        let req = test::TestRequest::post().uri("/orders/7/accept").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["order"]["status"], "confirmed");
        assert_eq!(body["changed"], true);

        let req = test::TestRequest::patch()
            .uri("/orders/4/status")
            .set_json(serde_json::json!({ "status": "pending" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post().uri("/orders/nope/cancel").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post().uri("/orders/1/cancel").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["order"]["status"], "cancelled");
    }

    #[actix_web::test]
    async fn test_create_order_lands_in_pending_view() {
        let state = app_state(TransitionPolicy::Permissive);
        let app = app!(state);
        let template = fixtures::sample_order("t", OrderStatus::Pending);

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(serde_json::json!({
                "marketplace": "Keeta",
                "customer": template.customer,
                "items": template.items,
                "deliveryAddress": template.delivery_address,
                "paymentMethod": "PIX",
                "estimatedDelivery": template.estimated_delivery,
                "deliveryFee": 5.0,
                "restaurant": template.restaurant,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/views/pending").to_request();
        let page: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["count"], 2);
        assert_eq!(page["action"]["action"], "accept");
    }

    #[actix_web::test]
    async fn test_view_selection_and_advance() {
        let state = app_state(TransitionPolicy::Permissive);
        let app = app!(state);

        let req = test::TestRequest::put()
            .uri("/views/confirmed/selection")
            .set_json(serde_json::json!({ "orderId": "2" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri("/views/confirmed").to_request();
        let page: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["selected"]["id"], "2");

        let req = test::TestRequest::post()
            .uri("/views/confirmed/orders/2/advance")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["order"]["status"], "preparing");

        // the selection falls back once order 2 has left the view
        let req = test::TestRequest::get().uri("/views/confirmed").to_request();
        let page: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["selected"]["id"], "1");

        let req = test::TestRequest::post()
            .uri("/views/delivered/orders/4/advance")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_refresh_visibility_and_health() {
        let state = app_state(TransitionPolicy::Permissive);
        let app = app!(state);

        let req = test::TestRequest::post().uri("/orders/refresh").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["outcome"], "applied");
        assert_eq!(body["error"], serde_json::Value::Null);

        let req = test::TestRequest::post()
            .uri("/visibility")
            .set_json(serde_json::json!({ "visible": true }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["refreshed"], false);

        let _lease = state.live.mount();
        let req = test::TestRequest::post()
            .uri("/visibility")
            .set_json(serde_json::json!({ "visible": true }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["refreshed"], true);

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["overall_status"]["state"], "healthy");

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
