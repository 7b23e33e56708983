//! Login and authentication-status queries
//!
//! The service has no structured status endpoint. Both operations fetch the
//! login page and infer the answer from marker substrings in the body, so
//! they are heuristics, fragile against markup changes on the service side.

use crate::config;
use crate::cookies::CookieJar;
use crate::error::Result;
use crate::extract;
use crate::session::SessionStore;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::redirect;

pub struct AuthClient {
    http: reqwest::Client,
    login_url: String,
    store: SessionStore,
}

impl AuthClient {
    /// Redirects are not followed here: the `Set-Cookie` headers and body
    /// the heuristics are defined over are the immediate login response.
    pub fn new(login_url: impl Into<String>, store: SessionStore) -> Result<Self> {
        let http = config::http_client_builder()
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            login_url: login_url.into(),
            store,
        })
    }

    /// Post credentials to the login endpoint and write the response cookies
    /// into the session jar.
    ///
    /// Returns `Ok(true)` when the response body carries no error marker;
    /// a reachable-but-rejected login is `Ok(false)`. On success the caller
    /// persists the username via [`SessionStore::save_username`]. Transport
    /// failure aborts before any session state is touched.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let res = self
            .http
            .post(&self.login_url)
            .form(&[("name", username), ("password", password)])
            .send()
            .await?;

        let host = res.url().host_str().unwrap_or_default().to_string();
        let set_cookies: Vec<String> = res
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        let body = res.text().await?;

        // The jar is rewritten from whatever cookies came back, even when
        // the heuristic reports a failed login.
        self.store.init()?;
        let jar_path = self.store.cookie_jar_path();
        let mut jar = CookieJar::load(jar_path)?;
        jar.store_response_cookies(set_cookies.iter().map(String::as_str), &host);
        jar.save(jar_path)?;

        Ok(!extract::has_error_marker(&body))
    }

    /// Heuristic session check: fetch the login page with the stored cookies
    /// and look for the authenticated marker.
    ///
    /// A jar can be present locally after the server has already invalidated
    /// the session; this returning `false` is the only staleness detection.
    pub async fn is_authenticated(&self) -> Result<bool> {
        let jar = CookieJar::load(self.store.cookie_jar_path())?;

        let mut req = self.http.get(&self.login_url);
        if let Some(header) = jar.header_for(&self.login_url) {
            req = req.header(COOKIE, header);
        }
        let body = req.send().await?.text().await?;

        Ok(extract::has_auth_marker(&body))
    }
}
