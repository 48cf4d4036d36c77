// Prompt builders for the import and derivation jobs. All prompts are
// single-turn; source text is truncated by the caller before it gets here.

/// Character budget for source text included in a summarization prompt.
pub const MAX_SOURCE_CHARS: usize = 1500;

/// Cap on matching-article titles seeded into a mystery overview prompt.
pub const MAX_OVERVIEW_TITLES: usize = 25;

pub fn import_summary_prompt(title: &str, text: &str) -> String {
    let bounded: String = text.chars().take(MAX_SOURCE_CHARS).collect();
    format!(
        "Write a 2-3 paragraph summary for an alternative history encyclopedia based on this \
content. Focus on the key mysteries or theories discussed.\n\nTitle: {}\nContent: {}",
        title, bounded
    )
}

pub fn connections_prompt(article_digest: &str) -> String {
    format!(
        "You are an alternative history researcher finding connections between ancient mysteries.

Here are articles in our database:

{}

Find meaningful connections between these articles. Look for:
1. **Flood myths** - Stories of great floods across different cultures
2. **Megalithic builders** - Similar construction techniques across continents
3. **Astronomical alignments** - Structures aligned to stars/solstices
4. **Lost technology** - Evidence of advanced ancient knowledge
5. **Cultural parallels** - Similar symbols, gods, or practices in distant cultures
6. **Timeline anomalies** - Things that don't fit the mainstream chronology
7. **Geographic mysteries** - Underwater structures, impossible locations

For each connection found, output a JSON object with this format:
{{
  \"connections\": [
    {{
      \"article1_index\": 0,
      \"article2_index\": 5,
      \"connection_type\": \"flood-myths\",
      \"explanation\": \"Both discuss flood narratives - one from Mesopotamia, one from Mesoamerica\"
    }}
  ]
}}

Find as many meaningful connections as possible. Only output valid JSON.",
        article_digest
    )
}

pub fn mystery_overview_prompt(name: &str, tagline: &str, article_titles: &[String]) -> String {
    let titles = article_titles
        .iter()
        .take(MAX_OVERVIEW_TITLES)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n- ");

    format!(
        "Write an engaging overview for an alternative history encyclopedia page about \"{}\".

Tagline: {}

Related articles in our database:
- {}

Write 3-4 paragraphs that:
1. Introduce the mystery and why it matters
2. Summarize the key evidence and theories
3. Explain what mainstream academia says vs. alternative researchers
4. End with thought-provoking questions

Write in an engaging, curious tone. Use markdown formatting.",
        name, tagline, titles
    )
}
