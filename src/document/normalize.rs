//! Page text normalization.

use super::types::Page;

/// Lowercase `raw` and collapse every whitespace run to a single space.
///
/// Idempotent: normalizing already-normalized text returns it unchanged.
pub fn normalize_text(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build numbered pages from per-page raw text, in source order.
///
/// Page numbers are 1-based. Pages that normalize to empty are kept so
/// the numbering of later pages stays aligned with the source document.
pub fn normalize_pages<I, S>(lines: I) -> Vec<Page>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            let raw = raw.into();
            let normalized_text = normalize_text(&raw);
            Page {
                number: idx as u32 + 1,
                raw_text: raw,
                normalized_text,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace_and_lowercases() {
        assert_eq!(
            normalize_text("  The   QUICK\tbrown\n fox  "),
            "the quick brown fox"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_text("  Mixed   CASE \t text ");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   \t  "), "");
    }

    #[test]
    fn test_pages_are_numbered_from_one_in_order() {
        let pages = normalize_pages(["First page.", "Second page."]);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[0].normalized_text, "first page.");
        assert_eq!(pages[1].number, 2);
        assert_eq!(pages[1].normalized_text, "second page.");
    }

    #[test]
    fn test_blank_page_keeps_its_number() {
        let pages = normalize_pages(["one.", "   ", "three."]);
        assert_eq!(pages.len(), 3);
        assert!(pages[1].is_blank());
        assert_eq!(pages[2].number, 3);
        assert_eq!(pages[2].normalized_text, "three.");
    }
}
