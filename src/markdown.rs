use pulldown_cmark::{html, Options, Parser};

/// Converts a post's Markdown body to HTML, appending the result to `out`.
/// Raw HTML in the source is passed through untouched, which is how authors
/// mark an explicit `summary` element.
pub fn to_html(out: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    html::push_html(out, Parser::new_ext(markdown, options));
}
