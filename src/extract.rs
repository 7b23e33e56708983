//! Field extraction from service HTML pages
//!
//! The bookmarking service exposes HTML pages, not a data API. Every pattern
//! the client depends on lives here, so a markup change on the service side
//! is a single localized point of failure.

use regex::Regex;
use scraper::{Html, Selector};

/// Substring present in the login response body when credentials were rejected.
const ERROR_MARKER: &str = "error-message";

/// Substring present in the login page body when the session is authenticated.
const AUTH_MARKER: &str = "oauth-message";

/// True if the page carries the login-error indicator.
pub fn has_error_marker(body: &str) -> bool {
    body.contains(ERROR_MARKER)
}

/// True if the page carries the authenticated-session indicator.
pub fn has_auth_marker(body: &str) -> bool {
    body.contains(AUTH_MARKER)
}

/// Extract the `value` attribute of the first `<input>` whose `name`
/// attribute equals `field`.
///
/// Matched with an attribute selector, so attribute order inside the element
/// and field order in the document do not matter. An input without a `value`
/// attribute is absent, never an empty string.
pub fn extract_field(body: &str, field: &str) -> Option<String> {
    let doc = Html::parse_document(body);
    select_attr(&doc, &format!(r#"input[name="{}"]"#, field), "value")
}

/// Extract the bookmark-count indicator: the numeric content of the first
/// `<span>N</span> users` occurrence.
///
/// Positional text rather than an addressable element, so this is the one
/// place a regex is used instead of a selector.
pub fn extract_user_count(body: &str) -> Option<u64> {
    let re = Regex::new(r"<span>(\d+)</span>\s*users?").unwrap();
    re.captures(body).and_then(|cap| cap[1].parse().ok())
}

/// Extract the text of every `class="tag"` element in document order.
pub fn extract_tags(body: &str) -> Vec<String> {
    let doc = Html::parse_document(body);
    let selector = match Selector::parse(".tag") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    doc.select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Extract the canonical-link target, if the page declares one.
pub fn extract_canonical_link(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);
    select_attr(&doc, r#"link[rel="canonical"]"#, "href")
}

fn select_attr(doc: &Html, sel: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(sel).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|s| s.to_string())
}
