use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use url::Url;

use crate::classify::{guess_category, guess_region};
use crate::db::{Article, Database, NewArticle};
use crate::discovery::Discovery;
use crate::error::{PipelineError, Result};
use crate::gazetteer::Gazetteer;
use crate::llm::Summarizer;
use crate::media::{build_embed, extract_youtube_id};
use crate::prompts;
use crate::slug::import_slug;
use crate::topics::{import_topics, RESULTS_PER_TOPIC};
use crate::TARGET_LLM_REQUEST;

const SUMMARY_MAX_TOKENS: u32 = 800;
const EXCERPT_MAX_CHARS: usize = 200;

/// Cap on the created-article sample returned in batch statistics.
const MAX_ARTICLE_SAMPLE: usize = 50;

/// One discovered item handed to the single-item importer.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportItem {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleRef {
    pub title: String,
    pub slug: String,
}

/// Aggregate counters for one batch import run.
#[derive(Debug, Default, Serialize)]
pub struct BatchStats {
    pub searched: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
    pub articles: Vec<ArticleRef>,
}

/// Counters for one location backfill run.
#[derive(Debug, Default, Serialize)]
pub struct BackfillStats {
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Pacing and topic configuration for a batch run. Tests zero the delays.
pub struct BatchConfig {
    pub topics: Vec<String>,
    pub results_per_topic: usize,
    pub item_delay: Duration,
    pub topic_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            topics: import_topics(),
            results_per_topic: RESULTS_PER_TOPIC,
            item_delay: Duration::from_millis(500),
            topic_delay: Duration::from_secs(1),
        }
    }
}

/// Turns one discovered item into one persisted article.
#[derive(Clone)]
pub struct Importer {
    db: Database,
    summarizer: Option<Arc<dyn Summarizer>>,
    gazetteer: Arc<Gazetteer>,
}

impl Importer {
    pub fn new(
        db: Database,
        summarizer: Option<Arc<dyn Summarizer>>,
        gazetteer: Arc<Gazetteer>,
    ) -> Self {
        Importer {
            db,
            summarizer,
            gazetteer,
        }
    }

    /// Imports a single item: summarize, classify, geolocate, persist.
    ///
    /// A summarization failure falls back to the raw source text; only
    /// missing required fields or a datastore failure fail the item.
    pub async fn import_single(&self, item: ImportItem) -> Result<Article> {
        if item.title.trim().is_empty() || item.url.trim().is_empty() {
            return Err(PipelineError::Validation(
                "title and url are required".to_string(),
            ));
        }
        if Url::parse(&item.url).is_err() {
            return Err(PipelineError::Validation(format!(
                "invalid source url: {}",
                item.url
            )));
        }

        let embed = build_embed(&item.url, item.video_id.as_deref());

        let summary = match (&self.summarizer, item.text.is_empty()) {
            (Some(summarizer), false) => {
                let prompt = prompts::import_summary_prompt(&item.title, &item.text);
                match summarizer.complete(&prompt, SUMMARY_MAX_TOKENS).await {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(target: TARGET_LLM_REQUEST, "Summarization failed for {}, falling back to source text: {}", item.url, err);
                        item.text.clone()
                    }
                }
            }
            (_, false) => item.text.clone(),
            (_, true) => "Content imported from external source.".to_string(),
        };

        let content = match &embed {
            Some(fragment) => format!(
                "{}\n\n---\n\n## Summary\n\n{}\n\n---\n\n**Source:** [{}]({})",
                fragment, summary, item.title, item.url
            ),
            None => format!(
                "## Summary\n\n{}\n\n---\n\n**Source:** [{}]({})",
                summary, item.title, item.url
            ),
        };

        let excerpt = derive_excerpt(&summary);

        let category = guess_category(&item.title, &item.text);
        let mut region = guess_region(&item.title, &item.text);

        // A gazetteer hit supplies coordinates and overrides the keyword
        // guess for region.
        let combined = format!("{} {}", item.title, item.text);
        let location = self.gazetteer.find_location(&combined);
        if let Some(ref loc) = location {
            region = loc.region;
        }

        let article = NewArticle {
            slug: import_slug(&item.title),
            title: item.title,
            category,
            region,
            content,
            excerpt,
            published: true,
            source_url: Some(item.url),
            latitude: location.as_ref().map(|loc| loc.latitude),
            longitude: location.as_ref().map(|loc| loc.longitude),
        };

        let created = self.db.create_article(&article).await?;
        info!("Imported article: {} ({})", created.title, created.slug);
        Ok(created)
    }
}

/// Walks the fixed topic list, discovering and importing new source items.
/// Re-running is safe: already-imported source URLs are skipped.
pub struct BatchImporter {
    db: Database,
    discovery: Arc<dyn Discovery>,
    importer: Importer,
    config: BatchConfig,
}

impl BatchImporter {
    pub fn new(
        db: Database,
        discovery: Arc<dyn Discovery>,
        importer: Importer,
        config: BatchConfig,
    ) -> Self {
        BatchImporter {
            db,
            discovery,
            importer,
            config,
        }
    }

    pub async fn run(&self) -> Result<BatchStats> {
        // A corpus-read failure here is fatal; everything after this point is
        // contained per item or per topic.
        let mut seen_urls: HashSet<String> =
            self.db.fetch_source_urls().await?.into_iter().collect();

        let mut stats = BatchStats::default();

        for topic in &self.config.topics {
            match self
                .discovery
                .search(topic, self.config.results_per_topic)
                .await
            {
                Ok(items) => {
                    stats.searched += 1;

                    for item in items {
                        if seen_urls.contains(&item.url) {
                            stats.skipped += 1;
                            continue;
                        }

                        let video_id = extract_youtube_id(&item.url);
                        match self
                            .importer
                            .import_single(ImportItem {
                                title: item.title,
                                url: item.url.clone(),
                                text: item.text,
                                video_id,
                            })
                            .await
                        {
                            Ok(article) => {
                                stats.imported += 1;
                                if stats.articles.len() < MAX_ARTICLE_SAMPLE {
                                    stats.articles.push(ArticleRef {
                                        title: article.title,
                                        slug: article.slug,
                                    });
                                }
                                // Later topics in this run must not re-import
                                // the same source.
                                seen_urls.insert(item.url);
                            }
                            Err(err) => {
                                warn!("Failed to import item for topic \"{}\": {}", topic, err);
                                stats.errors += 1;
                            }
                        }

                        sleep(self.config.item_delay).await;
                    }
                }
                Err(err) => {
                    // One bad topic must not abort the run.
                    warn!("Search failed for topic \"{}\": {}", topic, err);
                    stats.errors += 1;
                }
            }

            sleep(self.config.topic_delay).await;
        }

        info!(
            "Batch import finished: {} topics searched, {} imported, {} skipped, {} errors",
            stats.searched, stats.imported, stats.skipped, stats.errors
        );
        Ok(stats)
    }
}

/// Fills in coordinates for articles the gazetteer can now place.
pub async fn run_location_backfill(
    db: &Database,
    gazetteer: &Gazetteer,
) -> Result<BackfillStats> {
    let articles = db.fetch_articles_without_coordinates().await?;

    let mut stats = BackfillStats {
        total: articles.len(),
        ..BackfillStats::default()
    };

    for article in articles {
        let combined = format!("{} {}", article.title, article.content.unwrap_or_default());
        match gazetteer.find_location(&combined) {
            Some(location) => {
                match db
                    .update_article_location(
                        article.id,
                        location.latitude,
                        location.longitude,
                        location.region,
                    )
                    .await
                {
                    Ok(()) => stats.updated += 1,
                    Err(err) => {
                        warn!("Failed to update coordinates for article {}: {}", article.id, err);
                    }
                }
            }
            None => stats.skipped += 1,
        }
    }

    info!(
        "Location backfill finished: {} candidates, {} updated, {} skipped",
        stats.total, stats.updated, stats.skipped
    );
    Ok(stats)
}

fn derive_excerpt(summary: &str) -> String {
    let first_line = summary.lines().next().unwrap_or("");
    let truncated: String = first_line.chars().take(EXCERPT_MAX_CHARS).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Category, Region};
    use crate::discovery::SearchItem;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSummarizer {
        response: String,
    }

    #[async_trait]
    impl Summarizer for FakeSummarizer {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            Err(PipelineError::Upstream("summarizer down".to_string()))
        }
    }

    struct FakeDiscovery {
        items: Vec<SearchItem>,
        fail_queries: Vec<String>,
        calls: Mutex<usize>,
    }

    impl FakeDiscovery {
        fn new(items: Vec<SearchItem>) -> Self {
            FakeDiscovery {
                items,
                fail_queries: Vec::new(),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl Discovery for FakeDiscovery {
        async fn search(&self, query: &str, _num_results: usize) -> Result<Vec<SearchItem>> {
            *self.calls.lock().unwrap() += 1;
            if self.fail_queries.iter().any(|q| q == query) {
                return Err(PipelineError::Upstream("search down".to_string()));
            }
            Ok(self.items.clone())
        }
    }

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.expect("in-memory db")
    }

    fn test_importer(db: Database, summarizer: Option<Arc<dyn Summarizer>>) -> Importer {
        Importer::new(db, summarizer, Arc::new(Gazetteer::builtin()))
    }

    fn zero_delay_config(topics: Vec<String>) -> BatchConfig {
        BatchConfig {
            topics,
            results_per_topic: 3,
            item_delay: Duration::ZERO,
            topic_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_import_single_gobekli_scenario() {
        let db = test_db().await;
        let summarizer: Arc<dyn Summarizer> = Arc::new(FakeSummarizer {
            response: "A new excavation season at Gobekli Tepe.".to_string(),
        });
        let importer = test_importer(db.clone(), Some(summarizer));

        let article = importer
            .import_single(ImportItem {
                title: "Gobekli Tepe Update".to_string(),
                url: "https://youtu.be/abc123".to_string(),
                text: "New findings near Gobekli Tepe in Turkey".to_string(),
                video_id: None,
            })
            .await
            .unwrap();

        assert_eq!(article.category, Category::AncientSocieties);
        assert_eq!(article.region, Region::Asia);
        assert_eq!(article.latitude, Some(37.2233));
        assert_eq!(article.longitude, Some(38.9224));
        assert!(article.slug.starts_with("gobekli-tepe-update-"));
        assert!(article.slug.len() > "gobekli-tepe-update-".len());

        let content = article.content.unwrap();
        assert!(content.contains("youtube.com/embed/abc123"));
        assert!(content.contains("## Summary"));
        assert!(content.contains("**Source:** [Gobekli Tepe Update](https://youtu.be/abc123)"));
        assert_eq!(article.source_url.as_deref(), Some("https://youtu.be/abc123"));
        assert!(article.published);
    }

    #[tokio::test]
    async fn test_import_requires_title_and_url() {
        let db = test_db().await;
        let importer = test_importer(db, None);

        let result = importer
            .import_single(ImportItem {
                title: String::new(),
                url: "https://example.com".to_string(),
                text: String::new(),
                video_id: None,
            })
            .await;

        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_url() {
        let db = test_db().await;
        let importer = test_importer(db, None);

        let result = importer
            .import_single(ImportItem {
                title: "A title".to_string(),
                url: "not a url".to_string(),
                text: String::new(),
                video_id: None,
            })
            .await;

        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_summarizer_failure_falls_back_to_source_text() {
        let db = test_db().await;
        let summarizer: Arc<dyn Summarizer> = Arc::new(FailingSummarizer);
        let importer = test_importer(db, Some(summarizer));

        let article = importer
            .import_single(ImportItem {
                title: "Mysterious Walls".to_string(),
                url: "https://example.com/walls".to_string(),
                text: "The raw source description survives.".to_string(),
                video_id: None,
            })
            .await
            .unwrap();

        let content = article.content.unwrap();
        assert!(content.contains("The raw source description survives."));
    }

    #[tokio::test]
    async fn test_excerpt_is_first_line_truncated() {
        let long_line = "x".repeat(300);
        let excerpt = derive_excerpt(&format!("{}\nsecond line", long_line));
        assert_eq!(excerpt.len(), EXCERPT_MAX_CHARS + 3);
        assert!(excerpt.ends_with("..."));
        assert!(!excerpt.contains("second line"));
    }

    #[tokio::test]
    async fn test_batch_skips_duplicate_urls_within_run() {
        let db = test_db().await;
        let shared_url = "https://example.com/shared".to_string();
        let discovery = Arc::new(FakeDiscovery::new(vec![
            SearchItem {
                title: "First copy".to_string(),
                url: shared_url.clone(),
                text: "megalith".to_string(),
                published_date: None,
            },
            SearchItem {
                title: "Second copy".to_string(),
                url: shared_url,
                text: "megalith".to_string(),
                published_date: None,
            },
        ]));
        let importer = test_importer(db.clone(), None);
        let batch = BatchImporter::new(
            db.clone(),
            discovery,
            importer,
            zero_delay_config(vec!["megaliths".to_string()]),
        );

        let stats = batch.run().await.unwrap();
        assert_eq!(stats.imported, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 0);
        assert_eq!(db.count_articles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_rerun_is_idempotent() {
        let db = test_db().await;
        let discovery = Arc::new(FakeDiscovery::new(vec![SearchItem {
            title: "Puma Punku precision".to_string(),
            url: "https://example.com/puma-punku".to_string(),
            text: "puma punku stonework".to_string(),
            published_date: None,
        }]));
        let importer = test_importer(db.clone(), None);
        let config = zero_delay_config(vec!["puma punku".to_string()]);
        let batch = BatchImporter::new(db.clone(), discovery, importer, config);

        let first = batch.run().await.unwrap();
        assert_eq!(first.imported, 1);

        let second = batch.run().await.unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(db.count_articles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_continues_after_topic_error() {
        let db = test_db().await;
        let mut discovery = FakeDiscovery::new(vec![SearchItem {
            title: "Nazca from above".to_string(),
            url: "https://example.com/nazca".to_string(),
            text: "nazca lines".to_string(),
            published_date: None,
        }]);
        discovery.fail_queries.push("bad topic".to_string());

        let importer = test_importer(db.clone(), None);
        let batch = BatchImporter::new(
            db.clone(),
            Arc::new(discovery),
            importer,
            zero_delay_config(vec!["bad topic".to_string(), "nazca".to_string()]),
        );

        let stats = batch.run().await.unwrap();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.searched, 1);
        assert_eq!(stats.imported, 1);
    }

    #[tokio::test]
    async fn test_backfill_fills_missing_coordinates() {
        let db = test_db().await;

        // One locatable article without coordinates, one unlocatable.
        db.create_article(&NewArticle {
            title: "Walls above Cusco".to_string(),
            slug: "walls-above-cusco".to_string(),
            category: Category::AncientSocieties,
            region: Region::Global,
            content: "The fortress of Sacsayhuaman".to_string(),
            excerpt: String::new(),
            published: true,
            source_url: None,
            latitude: None,
            longitude: None,
        })
        .await
        .unwrap();
        db.create_article(&NewArticle {
            title: "An unplaceable mystery".to_string(),
            slug: "an-unplaceable-mystery".to_string(),
            category: Category::AncientSocieties,
            region: Region::Global,
            content: "no named site here".to_string(),
            excerpt: String::new(),
            published: true,
            source_url: None,
            latitude: None,
            longitude: None,
        })
        .await
        .unwrap();

        let stats = run_location_backfill(&db, &Gazetteer::builtin()).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.skipped, 1);

        // The located article no longer shows up as a candidate.
        let remaining = db.fetch_articles_without_coordinates().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "An unplaceable mystery");
    }
}
