use std::time::{SystemTime, UNIX_EPOCH};

const MAX_SLUG_LEN: usize = 80;

/// Derives a URL-safe slug from a title: lower-cased, every run of
/// non-alphanumeric characters collapsed to one hyphen, trimmed, capped at 80
/// characters. Uniqueness is the caller's concern.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = false;

    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    let trimmed = slug.trim_matches('-');
    trimmed.chars().take(MAX_SLUG_LEN).collect()
}

/// Slug for imported content: the title slug plus a base-36 timestamp suffix,
/// collision-resistant even for duplicate titles.
pub fn import_slug(title: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time travel")
        .as_millis() as u64;
    format!("{}-{}", generate_slug(title), to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).expect("base36 digits are ascii")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug() {
        assert_eq!(generate_slug("Gobekli Tepe Update"), "gobekli-tepe-update");
    }

    #[test]
    fn test_collapses_symbol_runs() {
        assert_eq!(generate_slug("What?! -- Really: yes"), "what-really-yes");
    }

    #[test]
    fn test_strips_leading_and_trailing_hyphens() {
        assert_eq!(generate_slug("...Atlantis..."), "atlantis");
    }

    #[test]
    fn test_non_ascii_becomes_hyphen() {
        assert_eq!(generate_slug("Göbekli Tepe"), "g-bekli-tepe");
    }

    #[test]
    fn test_slug_shape_and_length() {
        let long_title = "a".repeat(200);
        for title in ["Hello, World!", "  spaced  out  ", long_title.as_str(), "🗿🗿🗿"] {
            let slug = generate_slug(title);
            assert!(slug.len() <= MAX_SLUG_LEN);
            assert!(!slug.starts_with('-'));
            assert!(!slug.ends_with('-'));
            assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_import_slug_has_suffix() {
        let slug = import_slug("Gobekli Tepe Update");
        let suffix = slug.strip_prefix("gobekli-tepe-update-").unwrap();
        assert!(!suffix.is_empty());
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
