use std::sync::Arc;

use layoutsmith_db::Store;

use crate::config::ServerConfig;
use crate::generator::LayoutGenerator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend selected at startup.
    pub store: Arc<dyn Store>,
    /// Server configuration (JWT settings are read by the auth extractors).
    pub config: Arc<ServerConfig>,
    /// External layout generator.
    pub generator: Arc<dyn LayoutGenerator>,
}
