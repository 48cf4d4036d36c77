use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::db::{ArticleDigest, Database};
use crate::error::{PipelineError, Result};
use crate::llm::Summarizer;
use crate::prompts;

const OVERVIEW_MAX_TOKENS: u32 = 1000;

/// A curated mystery theme: its landing-page identity plus the keywords that
/// pull articles into it.
pub struct MysteryDef {
    pub slug: &'static str,
    pub name: &'static str,
    pub tagline: &'static str,
    pub icon: &'static str,
    pub keywords: &'static [&'static str],
}

pub const MYSTERY_DEFINITIONS: &[MysteryDef] = &[
    MysteryDef {
        slug: "flood-myths",
        name: "The Great Flood",
        tagline: "Why do cultures worldwide share stories of a catastrophic deluge?",
        icon: "\u{1F30A}",
        keywords: &[
            "flood",
            "deluge",
            "noah",
            "gilgamesh",
            "manu",
            "deucalion",
            "atlantis sinking",
        ],
    },
    MysteryDef {
        slug: "younger-dryas",
        name: "The Younger Dryas Impact",
        tagline: "Did a cosmic catastrophe end the Ice Age and destroy an ancient civilization?",
        icon: "\u{2604}\u{FE0F}",
        keywords: &[
            "younger dryas",
            "impact",
            "comet",
            "cataclysm",
            "12800",
            "12,800",
            "randall carlson",
            "gobekli",
            "g\u{f6}bekli",
            "tas tepeler",
            "karahan",
            "t-pillar",
        ],
    },
    MysteryDef {
        slug: "sphinx-age",
        name: "The Age of the Sphinx",
        tagline: "Water erosion suggests the Sphinx may be thousands of years older than claimed",
        icon: "\u{1F981}",
        keywords: &["sphinx", "water erosion", "schoch", "west", "older than"],
    },
    MysteryDef {
        slug: "pyramid-mysteries",
        name: "Pyramid Mysteries",
        tagline: "How were the pyramids really built, and what was their true purpose?",
        icon: "\u{1F53A}",
        keywords: &["pyramid", "giza", "great pyramid", "khufu", "cheops", "orion"],
    },
    MysteryDef {
        slug: "megalithic-builders",
        name: "The Megalithic Builders",
        tagline: "Who moved stones weighing hundreds of tons with supposed primitive technology?",
        icon: "\u{1F5FF}",
        keywords: &[
            "megalith",
            "baalbek",
            "puma punku",
            "sacsayhuaman",
            "stonehenge",
            "carnac",
            "massive stone",
        ],
    },
    MysteryDef {
        slug: "alien-interference",
        name: "Alien Interference in Human Development",
        tagline: "Did extraterrestrial beings guide the rise of human civilization?",
        icon: "\u{1F47D}",
        keywords: &[
            "ancient astronaut",
            "alien",
            "extraterrestrial",
            "anunnaki",
            "vimana",
            "ufo",
            "intervention",
            "genetic",
            "nephilim",
            "watchers",
            "sky people",
        ],
    },
    MysteryDef {
        slug: "lost-civilization",
        name: "Lost Civilization",
        tagline: "Evidence for an advanced global civilization before the Ice Age",
        icon: "\u{1F30D}",
        keywords: &[
            "lost civilization",
            "antediluvian",
            "pre-ice age",
            "graham hancock",
            "atlantis",
        ],
    },
    MysteryDef {
        slug: "astronomical-alignments",
        name: "Astronomical Alignments",
        tagline: "Ancient structures aligned to stars, solstices, and celestial events",
        icon: "\u{2B50}",
        keywords: &[
            "astronomical",
            "alignment",
            "solstice",
            "equinox",
            "orion",
            "sirius",
            "pleiades",
        ],
    },
    MysteryDef {
        slug: "underwater-ruins",
        name: "Underwater Ruins",
        tagline: "Submerged structures hint at civilizations lost to rising seas",
        icon: "\u{1F3CA}",
        keywords: &["underwater", "submerged", "yonaguni", "dwarka", "bimini", "sunken"],
    },
];

/// Keyword match against title plus content, case-insensitive.
pub fn article_matches(def: &MysteryDef, title: &str, content: &str) -> bool {
    let text = format!("{} {}", title, content).to_lowercase();
    def.keywords.iter().any(|kw| text.contains(kw))
}

/// Aggregate counters for one derivation run.
#[derive(Debug, Default, Serialize)]
pub struct DeriveStats {
    pub created: usize,
    pub updated: usize,
    pub linked: usize,
    pub errors: usize,
    pub mysteries: Vec<String>,
}

/// Walks the fixed mystery definitions, clusters the published corpus under
/// them by keyword, and generates an overview once per newly seen mystery.
pub struct MysteryDeriver {
    db: Database,
    summarizer: Arc<dyn Summarizer>,
    create_when_empty: bool,
}

impl MysteryDeriver {
    pub fn new(db: Database, summarizer: Arc<dyn Summarizer>) -> Self {
        MysteryDeriver {
            db,
            summarizer,
            create_when_empty: false,
        }
    }

    /// Also create mysteries that currently have no matching articles.
    pub fn create_when_empty(mut self, enabled: bool) -> Self {
        self.create_when_empty = enabled;
        self
    }

    pub async fn run(&self) -> Result<DeriveStats> {
        let articles = self.db.fetch_published_articles().await?;
        let mut stats = DeriveStats::default();

        for def in MYSTERY_DEFINITIONS {
            let matching: Vec<&ArticleDigest> = articles
                .iter()
                .filter(|article| {
                    article_matches(def, &article.title, article.content.as_deref().unwrap_or(""))
                })
                .collect();

            if matching.is_empty() && !self.create_when_empty {
                continue;
            }

            let mystery_id = match self.db.find_mystery_by_slug(def.slug).await? {
                Some(existing) => {
                    // Overviews are immutable: an existing mystery only gains
                    // new article links.
                    stats.updated += 1;
                    existing.id
                }
                None => {
                    let id = match self.create_with_overview(def, &matching).await {
                        Ok(id) => id,
                        Err(err) => {
                            error!("Failed to create mystery {}: {}", def.slug, err);
                            stats.errors += 1;
                            continue;
                        }
                    };
                    stats.created += 1;
                    stats.mysteries.push(def.name.to_string());
                    id
                }
            };

            for article in &matching {
                match self.db.link_mystery_article(mystery_id, article.id).await {
                    Ok(()) => stats.linked += 1,
                    Err(err) => {
                        error!(
                            "Failed to link article {} to mystery {}: {}",
                            article.id, def.slug, err
                        );
                        stats.errors += 1;
                    }
                }
            }
        }

        info!(
            "Mystery derivation finished: {} created, {} updated, {} linked",
            stats.created, stats.updated, stats.linked
        );
        Ok(stats)
    }

    async fn create_with_overview(
        &self,
        def: &MysteryDef,
        matching: &[&ArticleDigest],
    ) -> Result<i64> {
        let titles: Vec<String> = matching.iter().map(|a| a.title.clone()).collect();
        let prompt = prompts::mystery_overview_prompt(def.name, def.tagline, &titles);
        let overview = self
            .summarizer
            .complete(&prompt, OVERVIEW_MAX_TOKENS)
            .await?;

        if overview.trim().is_empty() {
            return Err(PipelineError::Data(format!(
                "empty overview generated for {}",
                def.slug
            )));
        }

        let id = self
            .db
            .create_mystery(def.slug, def.name, def.tagline, def.icon, &overview)
            .await?;
        Ok(id)
    }
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

    fn flood_article(title: &str, slug: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            slug: slug.to_string(),
            category: Category::AlternativeHistory,
            region: Region::Global,
            content: "A worldwide deluge preserved in myth.".to_string(),
            excerpt: String::new(),
            published: true,
            source_url: None,
            latitude: None,
            longitude: None,
        }
    }

    fn definition(slug: &str) -> &'static MysteryDef {
        MYSTERY_DEFINITIONS
            .iter()
            .find(|def| def.slug == slug)
            .unwrap()
    }

    #[test]
    fn test_article_matches_on_keyword() {
        let def = definition("flood-myths");
        assert!(article_matches(def, "The Epic of Gilgamesh", ""));
        assert!(article_matches(def, "Old tablets", "an account of the DELUGE"));
        assert!(!article_matches(def, "Desert trade routes", "camels and salt"));
    }

    #[test]
    fn test_matching_spans_title_and_content() {
        let def = definition("underwater-ruins");
        assert!(article_matches(def, "Yonaguni", ""));
        assert!(article_matches(def, "Strange terraces", "a submerged monument"));
    }

    #[tokio::test]
    async fn test_derive_creates_and_links() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.create_article(&flood_article("Gilgamesh and the flood", "gilgamesh-flood"))
            .await
            .unwrap();

        let summarizer = Arc::new(FakeSummarizer {
            response: "An overview of deluge traditions.".to_string(),
        });
        let deriver = MysteryDeriver::new(db.clone(), summarizer);

        let stats = deriver.run().await.unwrap();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.linked, 1);
        assert_eq!(stats.mysteries, vec!["The Great Flood".to_string()]);

        let mystery = db.find_mystery_by_slug("flood-myths").await.unwrap().unwrap();
        assert_eq!(
            mystery.overview.as_deref(),
            Some("An overview of deluge traditions.")
        );
        assert_eq!(db.count_mystery_links(mystery.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_existing_overview_is_never_regenerated() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.create_article(&flood_article("Gilgamesh and the flood", "gilgamesh-flood"))
            .await
            .unwrap();

        let first = MysteryDeriver::new(
            db.clone(),
            Arc::new(FakeSummarizer {
                response: "OVERVIEW ONE".to_string(),
            }),
        );
        first.run().await.unwrap();

        db.create_article(&flood_article("Manu and the fish", "manu-fish"))
            .await
            .unwrap();

        let second = MysteryDeriver::new(
            db.clone(),
            Arc::new(FakeSummarizer {
                response: "OVERVIEW TWO".to_string(),
            }),
        );
        let stats = second.run().await.unwrap();
        assert_eq!(stats.created, 0);
        assert_eq!(stats.updated, 1);

        // The original overview survives, but the new article gets linked.
        let mystery = db.find_mystery_by_slug("flood-myths").await.unwrap().unwrap();
        assert_eq!(mystery.overview.as_deref(), Some("OVERVIEW ONE"));
        assert_eq!(db.count_mystery_links(mystery.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_skips_mysteries_without_articles() {
        let db = Database::new("sqlite::memory:").await.unwrap();

        let deriver = MysteryDeriver::new(
            db.clone(),
            Arc::new(FakeSummarizer {
                response: "unused".to_string(),
            }),
        );
        let stats = deriver.run().await.unwrap();
        assert_eq!(stats.created, 0);
        assert!(db.find_mystery_by_slug("flood-myths").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_when_empty_seeds_all_definitions() {
        let db = Database::new("sqlite::memory:").await.unwrap();

        let deriver = MysteryDeriver::new(
            db.clone(),
            Arc::new(FakeSummarizer {
                response: "Seeded overview.".to_string(),
            }),
        )
        .create_when_empty(true);

        let stats = deriver.run().await.unwrap();
        assert_eq!(stats.created, MYSTERY_DEFINITIONS.len());
        assert_eq!(stats.linked, 0);
    }
}
