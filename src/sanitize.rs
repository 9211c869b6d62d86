//! Escaping and allow-list validation shared by the compiler and any preview renderer.

use ammonia::Builder;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;
use url::Url;

use crate::block::Length;

/// Schemes a link (`href`) may use
pub const LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Schemes an image source may use
pub const IMAGE_SCHEMES: &[&str] = &["http", "https", "data"];

/// Neutral base that relative references are resolved against
pub const DEFAULT_BASE_URL: &str = "https://example.com";

/// Tags the rich-text editor is allowed to emit; everything else is dropped.
const RICH_TEXT_ALLOWED_TAGS: &[&str] = &[
    "p", "br", "span", "div", "strong", "b", "em", "i", "u", "s", "strike", "mark", "code",
    "pre", "a", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote", "hr",
    "sub", "sup", "small",
];

pub(crate) fn default_base_url() -> &'static Url {
    static BASE: OnceLock<Url> = OnceLock::new();
    BASE.get_or_init(|| Url::parse(DEFAULT_BASE_URL).unwrap())
}

/// Replace the five HTML-significant characters with entities
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Escape an optional value; `None` yields an empty string
pub fn escape_opt(text: Option<&str>) -> String {
    text.map(escape_html).unwrap_or_default()
}

/// Stringify and escape a value for use inside a quoted attribute
pub fn escape_attribute(value: impl fmt::Display) -> String {
    escape_html(&value.to_string())
}

/// True iff `url` resolves (against the neutral base) to one of `allowed_schemes`
pub fn is_valid_url(url: &str, allowed_schemes: &[&str]) -> bool {
    is_valid_url_with_base(url, allowed_schemes, default_base_url())
}

/// [`is_valid_url`] with an explicit base for relative references
pub fn is_valid_url_with_base(url: &str, allowed_schemes: &[&str], base: &Url) -> bool {
    match Url::options().base_url(Some(base)).parse(url) {
        Ok(parsed) => allowed_schemes.contains(&parsed.scheme()),
        Err(_) => false,
    }
}

/// Escaped link target, or `#` when the URL is empty or not allowed
pub fn safe_link_url(url: &str, base: &Url) -> String {
    if !url.trim().is_empty() && is_valid_url_with_base(url, LINK_SCHEMES, base) {
        escape_html(url)
    } else {
        if !url.is_empty() {
            tracing::debug!(url, "rejected link url, using '#'");
        }
        "#".to_string()
    }
}

/// Escaped image source, or `None` when the URL is empty or not allowed
pub fn safe_image_url(url: &str, base: &Url) -> Option<String> {
    if !url.trim().is_empty() && is_valid_url_with_base(url, IMAGE_SCHEMES, base) {
        Some(escape_html(url))
    } else {
        if !url.is_empty() {
            tracing::debug!(url, "rejected image url");
        }
        None
    }
}

/// Width for a bare HTML `width` attribute: percent sign stripped, `None` means full width
pub fn format_width(width: Option<&Length>) -> String {
    match width {
        None => "100".to_string(),
        Some(Length::Text(s)) if s.is_empty() => "100".to_string(),
        Some(Length::Text(s)) => s.trim().trim_end_matches('%').to_string(),
        Some(Length::Number(n)) => n.to_string(),
    }
}

/// Leading integer of a dimension string such as `"12px"`; `default` when there is none
pub fn parse_px(value: &str, default: i64) -> i64 {
    static LEADING_INT: OnceLock<Regex> = OnceLock::new();
    let re = LEADING_INT.get_or_init(|| Regex::new(r"^\s*([+-]?\d+)").unwrap());
    re.captures(value)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(default)
}

/// Drop a `px` unit for attributes that take bare numbers
pub fn strip_px(value: &str) -> &str {
    value.trim().trim_end_matches("px")
}

/// Filter rich-text markup down to a safe tag subset.
///
/// Markup is parsed as HTML, so quoting and character references cannot hide attributes
/// or schemes. Disallowed tags are dropped with their text kept (`script` and `style`
/// lose their content too), only `style` and a few per-tag attributes survive, and link
/// targets must use one of [`LINK_SCHEMES`].
pub fn sanitize_rich_html(html: &str) -> String {
    let tags: HashSet<&str> = RICH_TEXT_ALLOWED_TAGS.iter().copied().collect();
    let generic_attributes: HashSet<&str> = ["style"].into_iter().collect();
    let url_schemes: HashSet<&str> = LINK_SCHEMES.iter().copied().collect();

    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("a", ["href", "title", "target"].into_iter().collect::<HashSet<_>>());
    tag_attributes.insert("ol", ["start"].into_iter().collect::<HashSet<_>>());

    Builder::new()
        .tags(tags)
        .generic_attributes(generic_attributes)
        .tag_attributes(tag_attributes)
        .url_schemes(url_schemes)
        .clean(html)
        .to_string()
}
