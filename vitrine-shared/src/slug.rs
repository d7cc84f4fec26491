/// URL-safe slug derivation
///
/// Products and categories carry a slug derived from their title/name on
/// save. Slugs are lowercase ASCII with hyphens, stable for identical input.
///
/// # Example
///
/// ```
/// use vitrine_shared::slug::slugify;
///
/// assert_eq!(slugify("Linen Shirt — Navy"), "linen-shirt-navy");
/// assert_eq!(slugify("  Mugs & Cups  "), "mugs-cups");
/// ```

/// Derives a URL-safe slug from a title string.
///
/// Non-alphanumeric runs collapse into single hyphens; leading and trailing
/// hyphens are stripped. Non-ASCII characters are dropped rather than
/// transliterated.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppresses a leading hyphen

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_title() {
        assert_eq!(slugify("Linen Shirt"), "linen-shirt");
    }

    #[test]
    fn test_punctuation_collapses() {
        assert_eq!(slugify("Mugs & Cups!"), "mugs-cups");
        assert_eq!(slugify("A -- B"), "a-b");
    }

    #[test]
    fn test_leading_trailing_stripped() {
        assert_eq!(slugify("  spaced out  "), "spaced-out");
        assert_eq!(slugify("---x---"), "x");
    }

    #[test]
    fn test_non_ascii_dropped() {
        assert_eq!(slugify("café table"), "caf-table");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(slugify("Same Title"), slugify("Same Title"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }
}
