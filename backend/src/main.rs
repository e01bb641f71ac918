use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chore_tracker_backend::config::Config;
use chore_tracker_backend::io::rest::{api_router, AppState};
use chore_tracker_backend::storage::{LocalPhotoStore, NoopPhotoStore, PhotoStore, SqliteConnection};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    info!("Connecting to database at {}", config.database_url);
    let connection = Arc::new(SqliteConnection::new(&config.database_url).await?);

    let photo_store: Arc<dyn PhotoStore> = match &config.photo_dir {
        Some(dir) => {
            info!("Storing photos under {}", dir.display());
            Arc::new(LocalPhotoStore::new(dir.clone()))
        }
        None => {
            info!("No photo directory configured; photo uploads are disabled");
            Arc::new(NoopPhotoStore)
        }
    };

    let state = AppState::new(connection, photo_store);
    let app = api_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
