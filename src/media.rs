use once_cell::sync::Lazy;
use regex::Regex;

static YOUTUBE_SHORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtu\.be/([a-zA-Z0-9_-]+)").expect("valid regex"));
static YOUTUBE_LONG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]v=([a-zA-Z0-9_-]+)").expect("valid regex"));

/// Extracts a canonical YouTube video id from either the short `youtu.be/<id>`
/// or the long `watch?v=<id>` URL shape.
pub fn extract_youtube_id(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }

    if let Some(caps) = YOUTUBE_SHORT_RE.captures(url) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = YOUTUBE_LONG_RE.captures(url) {
        return Some(caps[1].to_string());
    }
    None
}

/// Builds an embeddable media fragment for a source URL, if the platform is
/// recognized: a YouTube player for video ids, a Spotify player for podcast
/// URLs, otherwise nothing.
pub fn build_embed(url: &str, video_id: Option<&str>) -> Option<String> {
    let yt_id = video_id
        .map(|id| id.to_string())
        .or_else(|| extract_youtube_id(url));

    if let Some(id) = yt_id {
        return Some(format!(
            "<iframe width=\"100%\" height=\"400\" src=\"https://www.youtube.com/embed/{}\" frameborder=\"0\" allowfullscreen></iframe>",
            id
        ));
    }

    if url.contains("spotify.com") {
        let spotify_embed = url.replace("open.spotify.com", "open.spotify.com/embed");
        return Some(format!(
            "<iframe src=\"{}\" width=\"100%\" height=\"352\" frameBorder=\"0\" allowfullscreen allow=\"autoplay; clipboard-write; encrypted-media; fullscreen; picture-in-picture\"></iframe>",
            spotify_embed
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_url() {
        assert_eq!(
            extract_youtube_id("https://youtu.be/abc123").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/watch?list=x&v=abc_-9").as_deref(),
            Some("abc_-9")
        );
    }

    #[test]
    fn test_unrecognized_url() {
        assert_eq!(extract_youtube_id("https://example.com/article"), None);
        assert_eq!(extract_youtube_id(""), None);
    }

    #[test]
    fn test_explicit_video_id_wins() {
        let embed = build_embed("https://example.com/whatever", Some("xyz789")).unwrap();
        assert!(embed.contains("youtube.com/embed/xyz789"));
    }

    #[test]
    fn test_spotify_embed() {
        let embed =
            build_embed("https://open.spotify.com/episode/abc", None).unwrap();
        assert!(embed.contains("open.spotify.com/embed/episode/abc"));
    }

    #[test]
    fn test_no_embed_for_plain_articles() {
        assert_eq!(build_embed("https://ancientorigins.net/some-article", None), None);
    }
}
