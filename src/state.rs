use std::sync::Arc;

use crate::auth::jwt::JwtConfig;
use crate::store::Store;

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub jwt: JwtConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt: JwtConfig) -> Self {
        Self { store, jwt }
    }
}
