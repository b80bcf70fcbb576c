use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::health::{ComponentHealth, HealthStatus};
use crate::utils::{
    retry_on_transient, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, RetryConfig,
};

use super::source::{OrderSource, SourceError};

// ============================================================================
// Remote Order API Client
// ============================================================================
//
//   GET   {base}/orders                -> [Order]
//   PATCH {base}/orders/{id}/status    {"status": "..."}
//
// Order ids are percent-encoded as a single path segment.
// Every request goes through the circuit breaker. Status pushes are retried
// on transient failures; fetches are not.
//
// ============================================================================

pub struct HttpOrderSource {
    client: reqwest::Client,
    base_url: Url,
    breaker: CircuitBreaker,
    retry: RetryConfig,
}

#[derive(serde::Serialize)]
struct StatusPatch {
    status: OrderStatus,
}

impl HttpOrderSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url).map_err(|e| SourceError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url,
            breaker: CircuitBreaker::new("order_api", CircuitBreakerConfig::default()),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Base url with `segments` appended, each one percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn orders_url(&self) -> Result<Url, SourceError> {
        self.endpoint(&["orders"])
    }

    fn status_url(&self, id: &OrderId) -> Result<Url, SourceError> {
        self.endpoint(&["orders", id.as_str(), "status"])
    }

    async fn get_orders(&self) -> Result<Vec<Order>, SourceError> {
        let url = self.orders_url()?;
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json::<Vec<Order>>().await?)
    }

    async fn patch_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), SourceError> {
        let url = self.status_url(id)?;
        let response = self
            .client
            .patch(url.clone())
            .json(&StatusPatch { status })
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            reqwest::StatusCode::NOT_FOUND => Err(SourceError::NotFound(id.clone())),
            s => Err(SourceError::UnexpectedStatus { status: s.as_u16(), url: url.to_string() }),
        }
    }
}

fn unwrap_breaker(err: CircuitBreakerError<SourceError>) -> SourceError {
    match err {
        CircuitBreakerError::CircuitOpen => SourceError::CircuitOpen,
        CircuitBreakerError::OperationFailed(e) => e,
    }
}

#[async_trait]
impl OrderSource for HttpOrderSource {
    fn name(&self) -> &'static str {
        "order_api"
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, SourceError> {
        let orders = self
            .breaker
            .call(self.get_orders())
            .await
            .map_err(unwrap_breaker)?;

        tracing::debug!(count = orders.len(), base_url = %self.base_url, "Fetched orders from API");
        Ok(orders)
    }

    async fn push_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), SourceError> {
        retry_on_transient(&self.retry, "push_status", |_attempt| async move {
            self.breaker
                .call(self.patch_status(id, status))
                .await
                .map_err(unwrap_breaker)
        })
        .await?;

        tracing::info!(order_id = %id, status = %status, "Pushed status to order API");
        Ok(())
    }

    fn health(&self) -> ComponentHealth {
        let state = self.breaker.state();
        ComponentHealth::new(self.name(), HealthStatus::from_circuit(state))
            .with_details(format!("{} ({})", self.base_url, state.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures;
    use actix_web::{web, App, HttpResponse, HttpServer};
    use std::sync::Mutex;

    type PatchLog = web::Data<Mutex<Vec<(String, String)>>>;

    async fn list_orders() -> HttpResponse {
        HttpResponse::Ok().json(fixtures::seed_orders())
    }

    async fn patch_status(path: web::Path<String>, body: web::Json<serde_json::Value>, log: PatchLog) -> HttpResponse {
        let id = path.into_inner();
        if id == "missing" {
            return HttpResponse::NotFound().finish();
        }
        let status = body["status"].as_str().unwrap_or_default().to_string();
        log.lock().unwrap().push((id, status));
        HttpResponse::Ok().finish()
    }

    async fn broken() -> HttpResponse {
        HttpResponse::InternalServerError().finish()
    }

    /// Serves a fake order API on an ephemeral port and returns its base url
    fn spawn_fake_api(log: PatchLog) -> (String, actix_web::dev::ServerHandle) {
        let server = HttpServer::new(move || {
            App::new()
                .app_data(log.clone())
                .route("/ok/orders", web::get().to(list_orders))
                .route("/ok/orders/{id}/status", web::patch().to(patch_status))
                .route("/broken/orders", web::get().to(broken))
                .route("/broken/orders/{id}/status", web::patch().to(broken))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        let running = server.run();
        let handle = running.handle();
        actix_web::rt::spawn(running);

        (format!("http://{}", addr), handle)
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(10),
            multiplier: 2.0,
        }
    }

    #[actix_web::test]
    async fn test_fetch_and_push_against_api() {
        let log: PatchLog = web::Data::new(Mutex::new(Vec::new()));
        let (base, handle) = spawn_fake_api(log.clone());

        let source = HttpOrderSource::new(&format!("{}/ok/", base), Duration::from_secs(5)).unwrap();

        let orders = source.fetch_orders().await.unwrap();
        assert_eq!(orders, fixtures::seed_orders());

        source
            .push_status(&OrderId::from("3"), OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[("3".to_string(), "shipped".to_string())]
        );

        let err = source
            .push_status(&OrderId::from("missing"), OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));

        handle.stop(true).await;
    }

    #[test]
    fn test_order_id_is_a_single_encoded_segment() {
        for base in ["http://api.local/ok", "http://api.local/ok/"] {
            let source = HttpOrderSource::new(base, Duration::from_secs(1)).unwrap();

            let url = source.status_url(&OrderId::from("a/b?c#d")).unwrap();
            assert_eq!(url.path(), "/ok/orders/a%2Fb%3Fc%23d/status");
            assert_eq!(url.query(), None);
            assert_eq!(url.fragment(), None);

            assert_eq!(source.orders_url().unwrap().as_str(), "http://api.local/ok/orders");
        }
    }

    #[test]
    fn test_unparseable_base_url_is_rejected() {
        let err = HttpOrderSource::new("not a url", Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, SourceError::InvalidUrl(_)));
    }

    #[actix_web::test]
    async fn test_slash_in_order_id_reaches_the_status_route() {
        let log: PatchLog = web::Data::new(Mutex::new(Vec::new()));
        let (base, handle) = spawn_fake_api(log.clone());

        let source = HttpOrderSource::new(&format!("{}/ok", base), Duration::from_secs(5)).unwrap();
        source
            .push_status(&OrderId::from("7/cancel"), OrderStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[("7/cancel".to_string(), "confirmed".to_string())]
        );

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_server_errors_open_the_breaker() {
        let log: PatchLog = web::Data::new(Mutex::new(Vec::new()));
        let (base, handle) = spawn_fake_api(log);

        let breaker = CircuitBreaker::new(
            "order_api",
            CircuitBreakerConfig {
                failure_threshold: 3,
                open_timeout: Duration::from_secs(60),
                success_threshold: 1,
            },
        );
        let source = HttpOrderSource::new(&format!("{}/broken", base), Duration::from_secs(5))
            .unwrap()
            .with_breaker(breaker)
            .with_retry(fast_retry());

        let err = source.fetch_orders().await.unwrap_err();
        assert!(matches!(err, SourceError::UnexpectedStatus { status: 500, .. }));

        // failed fetch plus two push attempts trips the breaker
        let err = source
            .push_status(&OrderId::from("1"), OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::UnexpectedStatus { status: 500, .. }));
        assert_eq!(source.breaker().state(), crate::utils::CircuitState::Open);

        let err = source.fetch_orders().await.unwrap_err();
        assert!(matches!(err, SourceError::CircuitOpen));
        assert!(!source.health().status.is_healthy());

        handle.stop(true).await;
    }
}
