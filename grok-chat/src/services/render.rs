//! Markdown to HTML for model replies.

use ammonia::Builder;
use pulldown_cmark::{html, Options, Parser};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::OnceLock;

static SANITIZER: OnceLock<Builder<'static>> = OnceLock::new();

/// Ammonia's default allow-list, plus the attributes pulldown-cmark itself
/// emits: `text-align` on aligned table cells and `language-*` on fenced code.
fn sanitizer() -> &'static Builder<'static> {
    SANITIZER.get_or_init(|| {
        let mut builder = Builder::default();
        builder
            .add_tag_attributes("th", &["style"])
            .add_tag_attributes("td", &["style"])
            .add_tag_attributes("code", &["class"])
            .filter_style_properties(HashSet::from(["text-align"]))
            .attribute_filter(|element, attribute, value| match (element, attribute) {
                ("code", "class") => value
                    .split_whitespace()
                    .all(|class| class.starts_with("language-"))
                    .then_some(Cow::Borrowed(value)),
                _ => Some(Cow::Borrowed(value)),
            });
        builder
    })
}

/// Render CommonMark (fenced code is part of the core syntax) plus tables.
///
/// With `sanitize` the output is reduced to an allow-list of tags and
/// attributes; without it the HTML is returned exactly as generated, raw HTML
/// in the reply included.
pub fn render_markdown(markdown: &str, sanitize: bool) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);

    let mut rendered = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut rendered, parser);

    if sanitize {
        sanitizer().clean(&rendered).to_string()
    } else {
        rendered
    }
}
