use std::sync::Arc;

use deskline_ai::Assistant;
use deskline_db::Database;
use deskline_gateway::Gateway;
use deskline_kv::KeyValueStore;

use crate::session::SessionService;

pub type AppState = Arc<AppStateInner>;

/// Everything a handler can reach. Built once in `main` and shared.
pub struct AppStateInner {
    pub db: Arc<Database>,
    pub kv: Arc<dyn KeyValueStore>,
    pub sessions: SessionService,
    pub gateway: Gateway,
    pub assistant: Arc<Assistant>,
}
