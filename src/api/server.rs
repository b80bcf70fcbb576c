use actix_web::{web, App, HttpServer};
use std::net::SocketAddr;

use super::routes::{self, AppState};

/// Register every route; shared by the server and the tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(routes::health))
        .route("/metrics", web::get().to(routes::metrics))
        .route("/orders", web::get().to(routes::list_orders))
        .route("/orders", web::post().to(routes::create_order))
        .route("/orders/stats", web::get().to(routes::order_stats))
        .route("/orders/refresh", web::post().to(routes::refresh))
        .route("/orders/{id}", web::get().to(routes::get_order))
        .route("/orders/{id}/status", web::patch().to(routes::update_status))
        .route("/orders/{id}/accept", web::post().to(routes::accept_order))
        .route("/orders/{id}/cancel", web::post().to(routes::cancel_order))
        .route("/views/{status}", web::get().to(routes::get_view))
        .route("/views/{status}/selection", web::put().to(routes::select_in_view))
        .route("/views/{status}/orders/{id}/advance", web::post().to(routes::advance_in_view))
        .route("/visibility", web::post().to(routes::visibility));
}

/// Start the order desk HTTP server and run until shutdown
pub async fn start_api_server(state: web::Data<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    tracing::info!("📡 Starting order desk API on http://{}", addr);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(addr)?
        .run()
        .await
}
