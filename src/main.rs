//! Server: resolve settings, prepare the database, serve the API.

use api_boilerplate::{
    app, apply_migrations, ensure_database_exists, logging, AppState, PgSessionFactory, Settings,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;

const BIND_ADDR: &str = "0.0.0.0:8000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            // LOG_LEVEL may be the broken value, so report with the default level.
            logging::init(tracing::Level::INFO)?;
            tracing::error!(error = %e, "invalid configuration; refusing to start");
            return Err(e.into());
        }
    };
    logging::init(settings.log_level)?;
    settings.log_summary();

    ensure_database_exists(&settings.database_url).await?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await?;
    apply_migrations(&pool).await?;

    let state = AppState::new(settings, Arc::new(PgSessionFactory::new(pool)));
    let listener = TcpListener::bind(BIND_ADDR).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
