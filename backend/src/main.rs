use std::net::SocketAddr;

use property_listing_backend::app::{self, AppState};
use property_listing_backend::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    log::info!("Starting server on {}", addr);

    let state = AppState::new(config);
    let app = app::router(state);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
