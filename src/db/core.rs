use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Pool, Sqlite,
};
use std::str::FromStr;
use tokio::time::Duration;
use tracing::{info, instrument};

use crate::TARGET_DB;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Get access to the database pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    #[instrument(target = "db_query", level = "info")]
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        info!(target: TARGET_DB, "Creating database pool for: {}", database_url);

        // Accept a full sqlite connect string (tests pass "sqlite::memory:")
        // or a bare file path.
        let connect_string = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let connect_options = SqliteConnectOptions::from_str(&connect_string)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;

        info!(target: TARGET_DB, "Database pool created");

        let db = Database { pool };
        db.initialize_schema().await?;

        Ok(db)
    }

    async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                excerpt TEXT,
                content TEXT,
                category TEXT NOT NULL,
                region TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                cover_image TEXT,
                source_url TEXT,
                published BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_articles_published_category ON articles (published, category);
            CREATE INDEX IF NOT EXISTS idx_articles_published_region ON articles (published, region);
            CREATE INDEX IF NOT EXISTS idx_articles_source_url ON articles (source_url);

            CREATE TABLE IF NOT EXISTS article_connections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                related_article_id INTEGER NOT NULL,
                connection_type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (article_id) REFERENCES articles (id) ON DELETE CASCADE,
                FOREIGN KEY (related_article_id) REFERENCES articles (id) ON DELETE CASCADE,
                UNIQUE (article_id, related_article_id)
            );
            CREATE INDEX IF NOT EXISTS idx_connections_article_id ON article_connections (article_id);

            CREATE TABLE IF NOT EXISTS mysteries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                tagline TEXT NOT NULL,
                icon TEXT,
                overview TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS mystery_articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mystery_id INTEGER NOT NULL,
                article_id INTEGER NOT NULL,
                FOREIGN KEY (mystery_id) REFERENCES mysteries (id) ON DELETE CASCADE,
                FOREIGN KEY (article_id) REFERENCES articles (id) ON DELETE CASCADE,
                UNIQUE (mystery_id, article_id)
            );
            CREATE INDEX IF NOT EXISTS idx_mystery_articles_mystery_id ON mystery_articles (mystery_id);

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS article_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                FOREIGN KEY (article_id) REFERENCES articles (id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags (id) ON DELETE CASCADE,
                UNIQUE (article_id, tag_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        info!(target: TARGET_DB, "Tables ensured to exist");

        Ok(())
    }
}
