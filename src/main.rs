use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use kpm::backend::BackendClient;
use kpm::server::handlers;
use kpm::state::AppStateManager;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();
    tracing::info!("Starting KPM Analytics Node");

    // Upstream academy backend
    let backend = Arc::new(BackendClient::from_env()?);
    let state_manager = Arc::new(AppStateManager::new(backend));

    // Warm the cache; a dead backend at boot is not fatal, the first request
    // will retry.
    if let Err(e) = state_manager.refresh().await {
        tracing::warn!("Initial analysis refresh failed: {}", e);
    }

    let bind_addr =
        std::env::var("KPM_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:1228".to_string());
    let state_data = web::Data::new(state_manager.clone());

    tracing::info!("Starting HTTP server on {}", bind_addr);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .wrap(Logger::default())
            .service(handlers::health)
            // Analysis routes
            .service(handlers::performance)
            .service(handlers::players_roster)
            .service(handlers::refresh_analysis)
    })
    .bind(&bind_addr)?
    .run();

    // Wait for server to finish
    server.await?;

    Ok(())
}
