pub mod handlers;
pub mod state;

use actix_web::{web, App, HttpServer};

use crate::{config::Config, error::RelayError};

pub use state::AppState;

/// Route table, shared by the binary and the HTTP tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                .route("/generate", web::post().to(handlers::generate))
                .route("/proxy-image", web::get().to(handlers::proxy_image))
                .route("/prompt", web::post().to(handlers::compose_prompt))
                .route("/debug", web::get().to(handlers::debug_entries)),
        );
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let state = AppState::from_config(&config)
        .map_err(|e: RelayError| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let state = web::Data::new(state);

    log::info!("Endpoints:");
    log::info!("  GET  /");
    log::info!("  GET  /health");
    log::info!("  POST /api/generate");
    log::info!("  GET  /api/proxy-image?url=");
    log::info!("  POST /api/prompt");
    log::info!("  GET  /api/debug");

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind(config.bind_address())?
        .run()
        .await
}
