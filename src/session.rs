use sqlx::SqlitePool;
use tracing::debug;

use crate::db::repository;
use crate::error::AppError;

/// Local storage key the session token lives under.
pub const TOKEN_KEY: &str = "nihongo-admin-token";

#[derive(Clone, Debug)]
pub struct SessionStore {
    db: SqlitePool,
}

impl SessionStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn get_token(&self) -> Result<Option<String>, AppError> {
        let item = repository::find_item(&self.db, TOKEN_KEY).await?;
        Ok(item.map(|i| i.value).filter(|token| !token.is_empty()))
    }

    pub async fn set_token(&self, token: &str) -> Result<(), AppError> {
        repository::upsert_item(&self.db, TOKEN_KEY, token).await?;
        debug!("session token stored");
        Ok(())
    }

    pub async fn clear_token(&self) -> Result<(), AppError> {
        if repository::remove_item(&self.db, TOKEN_KEY).await? {
            debug!("session token cleared");
        }
        Ok(())
    }

    pub async fn is_authenticated(&self) -> Result<bool, AppError> {
        Ok(self.get_token().await?.is_some())
    }
}
