pub mod bulk;
pub mod clients;
pub mod config;
pub mod models;
pub mod routes;
pub mod session;

use std::sync::Arc;

use clients::BackendClient;
use clients::stats::StatsPoller;
use session::SessionKey;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub stats: Arc<StatsPoller>,
    pub sessions: Arc<SessionKey>,
    pub config: Arc<config::Config>,
}
