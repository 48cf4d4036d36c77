use chrono::Utc;
use tracing::{debug, instrument};

use super::Database;
use crate::connections::ConnectionType;
use crate::TARGET_DB;

impl Database {
    /// Records one direction of a connection edge. Re-running analysis upserts
    /// onto the same (article, related) pair instead of duplicating it.
    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn upsert_connection(
        &self,
        article_id: i64,
        related_article_id: i64,
        connection_type: ConnectionType,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO article_connections (article_id, related_article_id, connection_type, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(article_id, related_article_id) DO UPDATE SET
                connection_type = excluded.connection_type
            "#,
        )
        .bind(article_id)
        .bind(related_article_id)
        .bind(connection_type.as_str())
        .bind(&now)
        .execute(self.pool())
        .await?;

        debug!(
            target: TARGET_DB,
            "Connection recorded: {} -> {} ({})", article_id, related_article_id, connection_type
        );
        Ok(())
    }

    pub async fn count_connections(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM article_connections")
            .fetch_one(self.pool())
            .await
    }
}
