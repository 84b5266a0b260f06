//! Extracts the short plain-text excerpt shown for a post in listings and in
//! the feed. Authors can mark the excerpt explicitly by wrapping it in an
//! element with the `summary` class (Markdown passes raw HTML through):
//!
//! ```md
//! <p class="summary">Why I stopped skating vert.</p>
//!
//! The rest of the post...
//! ```
//!
//! Posts without such an element fall back to their first paragraph.

use scraper::{Html, Selector};

/// The selector for an explicitly designated summary element.
const SUMMARY_SELECTOR: &str = ".summary";

/// The selector used when no summary element exists.
const FALLBACK_SELECTOR: &str = "p";

/// Returns the text content of the first `.summary` element in `html`, or the
/// text of the first `<p>` if there is none, or the empty string if there is
/// neither. Whitespace runs are collapsed and the result is trimmed.
pub fn extract_summary(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    match first_text(&fragment, SUMMARY_SELECTOR) {
        Some(text) => text,
        None => {
            tracing::debug!("no summary element; falling back to first paragraph");
            first_text(&fragment, FALLBACK_SELECTOR).unwrap_or_default()
        }
    }
}

fn first_text(fragment: &Html, selector: &str) -> Option<String> {
    // Both selectors are constants, so parsing can't fail in practice.
    let selector = Selector::parse(selector).ok()?;
    fragment
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_designated_summary_wins() {
        let html = "<p>First paragraph.</p>\n\
                    <div class=\"summary\"><p>The <em>real</em> summary.</p></div>";
        assert_eq!("The real summary.", extract_summary(html));
    }

    #[test]
    fn test_falls_back_to_first_paragraph() {
        let html = "<h1>Title</h1>\n<p>Kickflips,\n  mostly.</p>\n<p>Second.</p>";
        assert_eq!("Kickflips, mostly.", extract_summary(html));
    }

    #[test]
    fn test_summary_class_among_others() {
        let html = "<p>Intro.</p><p class=\"lead summary\">Lead text.</p>";
        assert_eq!("Lead text.", extract_summary(html));
    }

    #[test]
    fn test_no_paragraph_yields_empty() {
        assert_eq!("", extract_summary("<h2>Only a heading</h2>"));
        assert_eq!("", extract_summary(""));
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!("Tom & Jerry", extract_summary("<p>Tom &amp; Jerry</p>"));
    }
}
