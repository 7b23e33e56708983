//! Two-phase bookmark protocol: confirm, then submit
//!
//! The confirm page yields the hidden fields the edit endpoint requires
//! (most importantly the `rks` token) plus bookmark metadata. Submission
//! posts those fields back verbatim with the comment. Both requests carry
//! the session cookies; neither updates the jar.

use crate::config;
use crate::cookies::CookieJar;
use crate::error::{Error, Result};
use crate::extract;
use crate::session::SessionStore;
use reqwest::header::COOKIE;
use serde::Serialize;
use std::fmt;

/// Failure sentinel reported when a submission yields no canonical link.
pub const FAIL_SENTINEL: &str = "fail?";

/// Fields scraped from the confirm page for one bookmark attempt.
///
/// Every field is independently optional; a missing field is recorded as
/// absent here and only rejected at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookmarkConfirmation {
    /// Per-session token authorizing the submission.
    pub rks: Option<String>,
    /// Target URL as the service normalized it.
    pub url: Option<String>,
    pub from: Option<String>,
    /// How many users already bookmarked the target.
    pub user_count: Option<u64>,
    /// Existing tags in document order.
    pub tags: Vec<String>,
}

impl BookmarkConfirmation {
    /// The three fields the edit endpoint requires, or the first one missing.
    fn required(&self) -> std::result::Result<(&str, &str, &str), Error> {
        let rks = self.rks.as_deref().ok_or(Error::MissingField("rks"))?;
        let url = self.url.as_deref().ok_or(Error::MissingField("url"))?;
        let from = self.from.as_deref().ok_or(Error::MissingField("from"))?;
        Ok((rks, url, from))
    }
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkOutcome {
    /// The service-assigned permanent URL of the saved bookmark.
    Saved(String),
    /// No canonical link in the final response.
    Rejected,
}

impl BookmarkOutcome {
    pub fn canonical(&self) -> Option<&str> {
        match self {
            BookmarkOutcome::Saved(link) => Some(link),
            BookmarkOutcome::Rejected => None,
        }
    }
}

impl fmt::Display for BookmarkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkOutcome::Saved(link) => write!(f, "{}", link),
            BookmarkOutcome::Rejected => write!(f, "{}", FAIL_SENTINEL),
        }
    }
}

pub struct BookmarkClient {
    http: reqwest::Client,
    base_url: String,
    store: SessionStore,
}

impl BookmarkClient {
    /// Uses the default redirect policy: the edit endpoint answers a
    /// successful submission with a redirect to the saved entry.
    pub fn new(base_url: impl Into<String>, store: SessionStore) -> Result<Self> {
        let http = config::http_client_builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            store,
        })
    }

    /// Fetch the confirm page for `target_url` and scrape the token and
    /// metadata out of it.
    ///
    /// Missing fields never fail here; an anonymous or stale session simply
    /// comes back with absent fields.
    pub async fn confirm(&self, user_id: &str, target_url: &str) -> Result<BookmarkConfirmation> {
        let confirm_url = format!("{}/{}/add.confirm", self.base_url, user_id);
        let jar = CookieJar::load(self.store.cookie_jar_path())?;

        let mut req = self
            .http
            .get(&confirm_url)
            .query(&[("url", target_url)]);
        if let Some(header) = jar.header_for(&confirm_url) {
            req = req.header(COOKIE, header);
        }
        let body = req.send().await?.text().await?;

        Ok(BookmarkConfirmation {
            rks: extract::extract_field(&body, "rks"),
            url: extract::extract_field(&body, "url"),
            from: extract::extract_field(&body, "from"),
            user_count: extract::extract_user_count(&body),
            tags: extract::extract_tags(&body),
        })
    }

    /// Post the confirmation fields back with `comment`, following redirects,
    /// and report the canonical link of the saved bookmark.
    ///
    /// An incomplete confirmation fails with [`Error::MissingField`] before
    /// any request is sent. The comment is form-encoded as-is and may carry
    /// arbitrary text.
    pub async fn submit(
        &self,
        user_id: &str,
        comment: &str,
        confirmation: &BookmarkConfirmation,
    ) -> Result<BookmarkOutcome> {
        let (rks, url, from) = confirmation.required()?;

        let post_url = format!("{}/{}/add.edit", self.base_url, user_id);
        let jar = CookieJar::load(self.store.cookie_jar_path())?;

        let mut req = self.http.post(&post_url).form(&[
            ("rks", rks),
            ("url", url),
            ("from", from),
            ("comment", comment),
        ]);
        if let Some(header) = jar.header_for(&post_url) {
            req = req.header(COOKIE, header);
        }
        let body = req.send().await?.text().await?;

        Ok(match extract::extract_canonical_link(&body) {
            Some(link) => BookmarkOutcome::Saved(link),
            None => BookmarkOutcome::Rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CONFIRM_PAGE: &str = concat!(
        r#"<input name="rks" value="abc123">"#,
        r#"<input name="url" value="http://example.com">"#,
        r#"<input name="from" value="f1">"#,
        r#"<span>42</span> users"#,
        r#"<span class="tag">ruby</span><span class="tag">web</span>"#,
    );

    fn seeded_store(dir: &std::path::Path) -> SessionStore {
        let store = SessionStore::new(dir.join("session"));
        store.init().unwrap();
        let mut jar = CookieJar::default();
        jar.store_response_cookies(["rk=tok"], "127.0.0.1");
        jar.save(store.cookie_jar_path()).unwrap();
        store
    }

    #[tokio::test]
    async fn test_confirm_extracts_all_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alice/add.confirm"))
            .and(query_param("url", "http://example.com/news"))
            .and(header("cookie", "rk=tok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CONFIRM_PAGE))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let client = BookmarkClient::new(server.uri(), seeded_store(dir.path())).unwrap();

        let confirmation = client
            .confirm("alice", "http://example.com/news")
            .await
            .unwrap();
        assert_eq!(confirmation.rks.as_deref(), Some("abc123"));
        assert_eq!(confirmation.url.as_deref(), Some("http://example.com"));
        assert_eq!(confirmation.from.as_deref(), Some("f1"));
        assert_eq!(confirmation.user_count, Some(42));
        assert_eq!(confirmation.tags, vec!["ruby", "web"]);
    }

    #[tokio::test]
    async fn test_confirm_tolerates_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alice/add.confirm"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html>please log in</html>"),
            )
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let client = BookmarkClient::new(server.uri(), seeded_store(dir.path())).unwrap();

        let confirmation = client.confirm("alice", "http://example.com").await.unwrap();
        assert_eq!(confirmation, BookmarkConfirmation::default());
    }

    #[tokio::test]
    async fn test_submit_returns_canonical_link() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/alice/add.edit"))
            .and(header("cookie", "rk=tok"))
            .and(body_string_contains("rks=abc123"))
            .and(body_string_contains("comment=a%26b"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<link rel="canonical" href="http://b.example.com/entry/1">"#,
            ))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let client = BookmarkClient::new(server.uri(), seeded_store(dir.path())).unwrap();

        let confirmation = BookmarkConfirmation {
            rks: Some("abc123".to_string()),
            url: Some("http://example.com".to_string()),
            from: Some("f1".to_string()),
            ..Default::default()
        };
        // '&' in the comment must survive as form data, not split a field
        let outcome = client.submit("alice", "a&b", &confirmation).await.unwrap();
        assert_eq!(
            outcome,
            BookmarkOutcome::Saved("http://b.example.com/entry/1".to_string())
        );
        assert_eq!(outcome.to_string(), "http://b.example.com/entry/1");
    }

    #[tokio::test]
    async fn test_submit_without_canonical_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/alice/add.edit"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html>looks fine</html>"),
            )
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let client = BookmarkClient::new(server.uri(), seeded_store(dir.path())).unwrap();

        let confirmation = BookmarkConfirmation {
            rks: Some("abc123".to_string()),
            url: Some("http://example.com".to_string()),
            from: Some("f1".to_string()),
            ..Default::default()
        };
        let outcome = client.submit("alice", "", &confirmation).await.unwrap();
        assert_eq!(outcome, BookmarkOutcome::Rejected);
        assert_eq!(outcome.to_string(), FAIL_SENTINEL);
    }

    #[tokio::test]
    async fn test_submit_incomplete_confirmation_fails_before_sending() {
        let server = MockServer::start().await;

        let dir = tempdir().unwrap();
        let client = BookmarkClient::new(server.uri(), seeded_store(dir.path())).unwrap();

        let err = client
            .submit("alice", "hi", &BookmarkConfirmation::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingField("rks")));

        let missing_from = BookmarkConfirmation {
            rks: Some("abc123".to_string()),
            url: Some("http://example.com".to_string()),
            ..Default::default()
        };
        let err = client.submit("alice", "hi", &missing_from).await.unwrap_err();
        assert!(matches!(err, Error::MissingField("from")));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_follows_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/alice/add.edit"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/alice/done", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/alice/done"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<link rel="canonical" href="http://b.example.com/entry/2">"#,
            ))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let client = BookmarkClient::new(server.uri(), seeded_store(dir.path())).unwrap();

        let confirmation = BookmarkConfirmation {
            rks: Some("abc123".to_string()),
            url: Some("http://example.com".to_string()),
            from: Some("f1".to_string()),
            ..Default::default()
        };
        let outcome = client.submit("alice", "", &confirmation).await.unwrap();
        assert_eq!(outcome.canonical(), Some("http://b.example.com/entry/2"));
    }

    #[tokio::test]
    async fn test_confirm_output_feeds_submit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alice/add.confirm"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CONFIRM_PAGE))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/alice/add.edit"))
            .and(body_string_contains("rks=abc123"))
            .and(body_string_contains("url=http%3A%2F%2Fexample.com"))
            .and(body_string_contains("from=f1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<link rel="canonical" href="http://b.example.com/entry/3">"#,
            ))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let client = BookmarkClient::new(server.uri(), seeded_store(dir.path())).unwrap();

        // the confirmation goes straight back in, only the comment is added
        let confirmation = client.confirm("alice", "http://example.com").await.unwrap();
        let outcome = client
            .submit("alice", "worth a read", &confirmation)
            .await
            .unwrap();
        assert_eq!(outcome.canonical(), Some("http://b.example.com/entry/3"));
    }
}
