use serde::{Deserialize, Serialize};
use std::fmt;

/// Article category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    AncientSocieties,
    AlternativeHistory,
    CosmicMysteries,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AncientSocieties => "ancient-societies",
            Category::AlternativeHistory => "alternative-history",
            Category::CosmicMysteries => "cosmic-mysteries",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s {
            "cosmic-mysteries" => Category::CosmicMysteries,
            "alternative-history" => Category::AlternativeHistory,
            _ => Category::AncientSocieties,
        }
    }
}

/// Coarse geographic bucket used for browsing and the map view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    Mediterranean,
    Americas,
    Asia,
    Africa,
    Europe,
    Oceania,
    Global,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Mediterranean => "mediterranean",
            Region::Americas => "americas",
            Region::Asia => "asia",
            Region::Africa => "africa",
            Region::Europe => "europe",
            Region::Oceania => "oceania",
            Region::Global => "global",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Region {
    fn from(s: &str) -> Self {
        match s {
            "mediterranean" => Region::Mediterranean,
            "americas" => Region::Americas,
            "asia" => Region::Asia,
            "africa" => Region::Africa,
            "europe" => Region::Europe,
            "oceania" => Region::Oceania,
            _ => Region::Global,
        }
    }
}

// Keyword groups checked in priority order: an item matching both the cosmic
// and alternative-history groups classifies as cosmic-mysteries.
const COSMIC_KEYWORDS: &[&str] = &[
    "alien",
    "ufo",
    "extraterrestrial",
    "ancient astronaut",
    "anunnaki",
    "cosmic",
];

const ALT_HISTORY_KEYWORDS: &[&str] = &[
    "flood",
    "younger dryas",
    "atlantis",
    "ice age",
    "cataclysm",
    "lost civilization",
    "impact",
];

// Region groups, also in priority order; no hit falls through to global.
const REGION_KEYWORDS: &[(Region, &[&str])] = &[
    (
        Region::Mediterranean,
        &[
            "egypt",
            "pyramid",
            "sphinx",
            "giza",
            "mediterranean",
            "greek",
            "roman",
        ],
    ),
    (
        Region::Americas,
        &["maya", "aztec", "inca", "peru", "mexico", "america", "olmec"],
    ),
    (
        Region::Asia,
        &["china", "japan", "india", "turkey", "gobekli", "asia"],
    ),
    (Region::Africa, &["africa", "sudan", "ethiopia"]),
    (
        Region::Europe,
        &["stonehenge", "britain", "ireland", "europe"],
    ),
    (
        Region::Oceania,
        &["australia", "pacific", "easter island", "oceania"],
    ),
];

/// Guess the category for an item from its title and source text.
pub fn guess_category(title: &str, text: &str) -> Category {
    let combined = format!("{} {}", title, text).to_lowercase();

    if COSMIC_KEYWORDS.iter().any(|kw| combined.contains(kw)) {
        return Category::CosmicMysteries;
    }
    if ALT_HISTORY_KEYWORDS.iter().any(|kw| combined.contains(kw)) {
        return Category::AlternativeHistory;
    }
    Category::AncientSocieties
}

/// Guess the region for an item from its title and source text.
///
/// A gazetteer hit made later in the import flow supersedes this guess.
pub fn guess_region(title: &str, text: &str) -> Region {
    let combined = format!("{} {}", title, text).to_lowercase();

    for (region, keywords) in REGION_KEYWORDS {
        if keywords.iter().any(|kw| combined.contains(kw)) {
            return *region;
        }
    }
    Region::Global
}
