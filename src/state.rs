use std::sync::Arc;

use sqlx::SqlitePool;

use crate::cache::QueryCache;
use crate::lms::LmsClient;
use crate::services::ConsoleService;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub lms: Arc<dyn LmsClient>,
    pub cache: QueryCache,
    pub session: SessionStore,
    pub bypass_auth: bool,
}

impl AppState {
    pub fn console(&self) -> ConsoleService {
        ConsoleService::new(self.lms.clone(), self.cache.clone())
    }
}
