use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{PipelineError, Result};
use crate::llm::Summarizer;
use crate::prompts;
use crate::TARGET_LLM_REQUEST;

const ANALYSIS_MAX_TOKENS: u32 = 4000;
const DIGEST_EXCERPT_CHARS: usize = 150;

/// Cap on the connection sample returned in analysis statistics.
const MAX_CONNECTION_SAMPLE: usize = 20;

/// Fixed taxonomy of thematic relationships between articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionType {
    FloodMyths,
    Megalithic,
    Astronomical,
    LostTechnology,
    CulturalParallels,
    Timeline,
    Geographic,
    Thematic,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::FloodMyths => "flood-myths",
            ConnectionType::Megalithic => "megalithic",
            ConnectionType::Astronomical => "astronomical",
            ConnectionType::LostTechnology => "lost-technology",
            ConnectionType::CulturalParallels => "cultural-parallels",
            ConnectionType::Timeline => "timeline",
            ConnectionType::Geographic => "geographic",
            ConnectionType::Thematic => "thematic",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for ConnectionType {
    fn from(s: &str) -> Self {
        match s {
            "flood-myths" => ConnectionType::FloodMyths,
            "megalithic" => ConnectionType::Megalithic,
            "astronomical" => ConnectionType::Astronomical,
            "lost-technology" => ConnectionType::LostTechnology,
            "cultural-parallels" => ConnectionType::CulturalParallels,
            "timeline" => ConnectionType::Timeline,
            "geographic" => ConnectionType::Geographic,
            // Keep the edge rather than drop it when the model invents a
            // label outside the taxonomy.
            _ => ConnectionType::Thematic,
        }
    }
}

/// One connection as reported by the language model, referencing articles by
/// their position in the corpus digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundConnection {
    pub article1_index: usize,
    pub article2_index: usize,
    pub connection_type: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConnectionList {
    #[serde(default)]
    connections: Vec<FoundConnection>,
}

/// Aggregate counters for one analysis run.
#[derive(Debug, Default, Serialize)]
pub struct AnalysisStats {
    pub found: usize,
    pub saved: usize,
    pub errors: usize,
    pub connections: Vec<FoundConnection>,
}

/// Asks the language model for thematic relationships across the published
/// corpus and persists them as bidirectional edges.
pub struct ConnectionAnalyzer {
    db: Database,
    summarizer: Arc<dyn Summarizer>,
}

impl ConnectionAnalyzer {
    pub fn new(db: Database, summarizer: Arc<dyn Summarizer>) -> Self {
        ConnectionAnalyzer { db, summarizer }
    }

    pub async fn run(&self) -> Result<AnalysisStats> {
        let articles = self.db.fetch_published_articles().await?;
        if articles.is_empty() {
            return Err(PipelineError::Data(
                "no published articles to analyze".to_string(),
            ));
        }

        // One digest line per article, indexed so the response can refer back
        // into the corpus.
        let digest = articles
            .iter()
            .enumerate()
            .map(|(i, article)| {
                let excerpt: String = article
                    .excerpt
                    .as_deref()
                    .unwrap_or("")
                    .chars()
                    .take(DIGEST_EXCERPT_CHARS)
                    .collect();
                format!(
                    "[{}] \"{}\" ({}, {}): {}",
                    i, article.title, article.category, article.region, excerpt
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = prompts::connections_prompt(&digest);
        let response = self.summarizer.complete(&prompt, ANALYSIS_MAX_TOKENS).await?;

        let connections = match parse_connections(&response) {
            Ok(connections) => connections,
            Err(err) => {
                // Treat an unparseable response as zero results, not a crash.
                warn!(target: TARGET_LLM_REQUEST, "Failed to parse connection list: {}", err);
                return Ok(AnalysisStats {
                    errors: 1,
                    ..AnalysisStats::default()
                });
            }
        };

        let mut stats = AnalysisStats {
            found: connections.len(),
            ..AnalysisStats::default()
        };

        for conn in &connections {
            // Out-of-range indices are skipped, not persisted.
            let (Some(first), Some(second)) = (
                articles.get(conn.article1_index),
                articles.get(conn.article2_index),
            ) else {
                continue;
            };

            let connection_type = ConnectionType::from(conn.connection_type.as_str());

            // Both directions of the edge; upsert keeps re-runs additive.
            let forward = self
                .db
                .upsert_connection(first.id, second.id, connection_type)
                .await;
            let reverse = self
                .db
                .upsert_connection(second.id, first.id, connection_type)
                .await;

            match (forward, reverse) {
                (Ok(()), Ok(())) => stats.saved += 1,
                _ => stats.errors += 1,
            }
        }

        stats.connections = connections
            .into_iter()
            .take(MAX_CONNECTION_SAMPLE)
            .collect();

        info!(
            "Connection analysis finished: {} found, {} saved, {} errors",
            stats.found, stats.saved, stats.errors
        );
        Ok(stats)
    }
}

/// Extracts the first JSON-looking block from free text: everything from the
/// first `{` through the last `}`.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn parse_connections(response: &str) -> Result<Vec<FoundConnection>> {
    let block = extract_json_block(response).ok_or_else(|| {
        PipelineError::Parse("response contained no JSON block".to_string())
    })?;

    let parsed: ConnectionList = serde_json::from_str(block)?;
    Ok(parsed.connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Category, Region};
    use crate::db::NewArticle;
    use async_trait::async_trait;

    struct FakeSummarizer {
        response: String,
    }

    #[async_trait]
    impl Summarizer for FakeSummarizer {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    fn new_article(title: &str, slug: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            slug: slug.to_string(),
            category: Category::AncientSocieties,
            region: Region::Global,
            content: String::new(),
            excerpt: String::new(),
            published: true,
            source_url: None,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn test_extract_json_block_ignores_surrounding_prose() {
        let text = "Here are the connections I found:\n{\"connections\": []}\nLet me know!";
        assert_eq!(extract_json_block(text), Some("{\"connections\": []}"));
    }

    #[test]
    fn test_extract_json_block_missing() {
        assert_eq!(extract_json_block("no structured payload here"), None);
        assert_eq!(extract_json_block("} backwards {"), None);
    }

    #[test]
    fn test_parse_connections() {
        let response = r#"Sure! Here is the JSON:
{
  "connections": [
    {
      "article1_index": 0,
      "article2_index": 1,
      "connection_type": "flood-myths",
      "explanation": "Both discuss deluge narratives"
    }
  ]
}
Hope this helps."#;

        let connections = parse_connections(response).unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].article1_index, 0);
        assert_eq!(connections[0].article2_index, 1);
        assert_eq!(
            ConnectionType::from(connections[0].connection_type.as_str()),
            ConnectionType::FloodMyths
        );
    }

    #[test]
    fn test_unknown_connection_type_becomes_thematic() {
        assert_eq!(
            ConnectionType::from("vibes-based"),
            ConnectionType::Thematic
        );
    }

    #[tokio::test]
    async fn test_analyzer_requires_articles() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let summarizer = Arc::new(FakeSummarizer {
            response: String::new(),
        });
        let analyzer = ConnectionAnalyzer::new(db, summarizer);

        assert!(matches!(
            analyzer.run().await,
            Err(PipelineError::Data(_))
        ));
    }

    #[tokio::test]
    async fn test_analyzer_is_idempotent() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.create_article(&new_article("Flood tablets of Sumer", "flood-tablets"))
            .await
            .unwrap();
        db.create_article(&new_article("Andean deluge stories", "andean-deluge"))
            .await
            .unwrap();

        let summarizer = Arc::new(FakeSummarizer {
            response: r#"{"connections": [{"article1_index": 0, "article2_index": 1, "connection_type": "flood-myths", "explanation": "shared deluge motif"}]}"#.to_string(),
        });
        let analyzer = ConnectionAnalyzer::new(db.clone(), summarizer);

        let first = analyzer.run().await.unwrap();
        assert_eq!(first.found, 1);
        assert_eq!(first.saved, 1);
        assert_eq!(db.count_connections().await.unwrap(), 2);

        // Unchanged corpus, unchanged response: no new rows.
        let second = analyzer.run().await.unwrap();
        assert_eq!(second.saved, 1);
        assert_eq!(db.count_connections().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_skipped() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.create_article(&new_article("Lonely article", "lonely-article"))
            .await
            .unwrap();

        let summarizer = Arc::new(FakeSummarizer {
            response: r#"{"connections": [{"article1_index": 0, "article2_index": 99, "connection_type": "timeline"}]}"#.to_string(),
        });
        let analyzer = ConnectionAnalyzer::new(db.clone(), summarizer);

        let stats = analyzer.run().await.unwrap();
        assert_eq!(stats.found, 1);
        assert_eq!(stats.saved, 0);
        assert_eq!(db.count_connections().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_response_is_recorded_not_fatal() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.create_article(&new_article("Some article", "some-article"))
            .await
            .unwrap();

        let summarizer = Arc::new(FakeSummarizer {
            response: "I could not find any structure worth reporting.".to_string(),
        });
        let analyzer = ConnectionAnalyzer::new(db, summarizer);

        let stats = analyzer.run().await.unwrap();
        assert_eq!(stats.found, 0);
        assert_eq!(stats.errors, 1);
    }
}
