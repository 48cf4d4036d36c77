use chrono::Utc;
use sqlx::Row;
use tracing::{debug, instrument};

use super::Database;
use crate::TARGET_DB;

#[derive(Debug, Clone)]
pub struct MysteryRow {
    pub id: i64,
    pub slug: String,
    pub overview: Option<String>,
}

impl Database {
    pub async fn find_mystery_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<MysteryRow>, sqlx::Error> {
        let row = sqlx::query("SELECT id, slug, overview FROM mysteries WHERE slug = ?1")
            .bind(slug)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|row| MysteryRow {
            id: row.get("id"),
            slug: row.get("slug"),
            overview: row.get("overview"),
        }))
    }

    /// Creates a mystery row. Overviews are written once here and never
    /// regenerated; derivation treats an existing slug as immutable.
    #[instrument(target = "db_query", level = "info", skip(self, tagline, overview))]
    pub async fn create_mystery(
        &self,
        slug: &str,
        name: &str,
        tagline: &str,
        icon: &str,
        overview: &str,
    ) -> Result<i64, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query(
            r#"
            INSERT INTO mysteries (slug, name, tagline, icon, overview, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(slug)
        .bind(name)
        .bind(tagline)
        .bind(icon)
        .bind(overview)
        .bind(&now)
        .fetch_one(self.pool())
        .await?;

        let id: i64 = row.get("id");
        debug!(target: TARGET_DB, "Mystery created: {} with id {}", slug, id);
        Ok(id)
    }

    /// Associates an article with a mystery, idempotent on the pair.
    pub async fn link_mystery_article(
        &self,
        mystery_id: i64,
        article_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO mystery_articles (mystery_id, article_id)
            VALUES (?1, ?2)
            ON CONFLICT(mystery_id, article_id) DO NOTHING
            "#,
        )
        .bind(mystery_id)
        .bind(article_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn count_mystery_links(&self, mystery_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM mystery_articles WHERE mystery_id = ?1")
            .bind(mystery_id)
            .fetch_one(self.pool())
            .await
    }
}
