use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::database::DocumentStore;

/// Shared application state handed to every handler via `State<AppState>`.
///
/// Cheap to clone; everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<TokenVerifier>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Self {
        let verifier = TokenVerifier::new(config.security.jwt_secret.expose());
        Self {
            store,
            verifier: Arc::new(verifier),
            config: Arc::new(config),
        }
    }
}
