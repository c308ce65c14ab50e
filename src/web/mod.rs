pub mod handlers;
pub mod models;
pub mod routes;

use std::sync::Arc;

use crate::upstream::CompletionBackend;

// App state structure
pub struct AppState {
    pub upstream: Arc<dyn CompletionBackend>,
}
