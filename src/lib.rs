use std::sync::Arc;

use actix_web::web;
use log::info;

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;

pub use state::AppState;

use config::{ConfigError, ServerConfig};
use store::memory::MemoryStore;
use store::mysql::MySqlStore;
use store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to seed demo data: {0}")]
    Seed(#[from] bcrypt::BcryptError),
}

/// Every route of the application.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(routes::routes::index))
        .configure(routes::routes::api_configure);
}

/// MySQL when `DATABASE_URL` is set, the in-memory store otherwise.
pub async fn build_store(config: &ServerConfig) -> Result<Arc<dyn Store>, StartupError> {
    if let Some(url) = &config.database_url {
        let store = MySqlStore::connect(url, config.max_connections).await?;
        return Ok(Arc::new(store));
    }

    if config.seed_demo_data {
        info!("Using the in-memory store with demo data");
        Ok(Arc::new(MemoryStore::with_demo_data()?))
    } else {
        info!("Using an empty in-memory store");
        Ok(Arc::new(MemoryStore::new()))
    }
}
