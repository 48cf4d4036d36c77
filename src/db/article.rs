use chrono::Utc;
use serde::Serialize;
use sqlx::Row;
use tracing::{debug, error, instrument};

use super::Database;
use crate::classify::{Category, Region};
use crate::TARGET_DB;

/// A fully persisted article row.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Category,
    pub region: Region,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source_url: Option<String>,
    pub published: bool,
}

/// Fields for a new article row. `slug` must be unique; a collision surfaces
/// as a create failure rather than overwriting the existing row.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub category: Category,
    pub region: Region,
    pub content: String,
    pub excerpt: String,
    pub published: bool,
    pub source_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// The projection of a published article used by the derivation jobs.
#[derive(Debug, Clone)]
pub struct ArticleDigest {
    pub id: i64,
    pub title: String,
    pub excerpt: Option<String>,
    pub category: Category,
    pub region: Region,
    pub content: Option<String>,
}

/// An article with no coordinates yet, candidate for location backfill.
#[derive(Debug, Clone)]
pub struct UnlocatedArticle {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
}

impl Database {
    #[instrument(target = "db_query", level = "info", skip(self, article))]
    pub async fn create_article(&self, article: &NewArticle) -> Result<Article, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        debug!(target: TARGET_DB, "Creating article: {}", article.slug);

        let row = sqlx::query(
            r#"
            INSERT INTO articles (
                slug, title, excerpt, content, category, region,
                latitude, longitude, source_url, published, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            RETURNING id
            "#,
        )
        .bind(&article.slug)
        .bind(&article.title)
        .bind(&article.excerpt)
        .bind(&article.content)
        .bind(article.category.as_str())
        .bind(article.region.as_str())
        .bind(article.latitude)
        .bind(article.longitude)
        .bind(&article.source_url)
        .bind(article.published)
        .bind(&now)
        .fetch_one(self.pool())
        .await
        .map_err(|err| {
            error!(target: TARGET_DB, "Failed to create article {}: {}", article.slug, err);
            err
        })?;

        let id: i64 = row.get("id");
        debug!(target: TARGET_DB, "Article created: {} with id {}", article.slug, id);

        Ok(Article {
            id,
            slug: article.slug.clone(),
            title: article.title.clone(),
            excerpt: Some(article.excerpt.clone()),
            content: Some(article.content.clone()),
            category: article.category,
            region: article.region,
            latitude: article.latitude,
            longitude: article.longitude,
            source_url: article.source_url.clone(),
            published: article.published,
        })
    }

    /// All published articles, projected down to the fields the derivation
    /// jobs consume.
    pub async fn fetch_published_articles(&self) -> Result<Vec<ArticleDigest>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, excerpt, category, region, content
            FROM articles
            WHERE published = 1
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ArticleDigest {
                id: row.get("id"),
                title: row.get("title"),
                excerpt: row.get("excerpt"),
                category: Category::from(row.get::<String, _>("category").as_str()),
                region: Region::from(row.get::<String, _>("region").as_str()),
                content: row.get("content"),
            })
            .collect())
    }

    /// The source URLs of every imported article, for the batch dedupe set.
    pub async fn fetch_source_urls(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT source_url FROM articles WHERE source_url IS NOT NULL",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Articles that have no coordinates yet.
    pub async fn fetch_articles_without_coordinates(
        &self,
    ) -> Result<Vec<UnlocatedArticle>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, title, content FROM articles WHERE latitude IS NULL ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UnlocatedArticle {
                id: row.get("id"),
                title: row.get("title"),
                content: row.get("content"),
            })
            .collect())
    }

    #[instrument(target = "db_query", level = "info", skip(self))]
    pub async fn update_article_location(
        &self,
        article_id: i64,
        latitude: f64,
        longitude: f64,
        region: Region,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE articles
            SET latitude = ?1, longitude = ?2, region = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(latitude)
        .bind(longitude)
        .bind(region.as_str())
        .bind(&now)
        .bind(article_id)
        .execute(self.pool())
        .await?;
        debug!(target: TARGET_DB, "Updated coordinates for article {}", article_id);
        Ok(())
    }

    pub async fn count_articles(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(self.pool())
            .await
    }
}
