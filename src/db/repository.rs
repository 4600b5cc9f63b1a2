use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

/// One row of the console's key/value local storage.
#[derive(Debug, Clone, FromRow)]
pub struct StoredItem {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

pub async fn find_item(db: &SqlitePool, key: &str) -> Result<Option<StoredItem>, sqlx::Error> {
    sqlx::query_as::<_, StoredItem>(
        "SELECT key, value, updated_at FROM local_storage WHERE key = ?",
    )
    .bind(key)
    .fetch_optional(db)
    .await
}

pub async fn upsert_item(db: &SqlitePool, key: &str, value: &str) -> Result<StoredItem, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO local_storage (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(StoredItem {
        key: key.to_string(),
        value: value.to_string(),
        updated_at: now,
    })
}

pub async fn remove_item(db: &SqlitePool, key: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM local_storage WHERE key = ?")
        .bind(key)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
