//! Netscape cookie-jar persistence
//!
//! The session lives in a cookie file using the curl cookie-jar text layout
//! (tab-separated, seven fields per line), so a jar written by curl keeps
//! working and the file stays inspectable. The jar is rewritten from
//! `Set-Cookie` headers at login and only read for every other request.

use crate::error::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::Path;
use url::Url;

const FILE_HEADER: &str = "# Netscape HTTP Cookie File";

/// One cookie, as one line of the jar file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Host the cookie belongs to, without a leading dot.
    pub domain: String,
    /// Whether subdomains of `domain` also receive the cookie.
    pub include_subdomains: bool,
    pub path: String,
    /// Only send over https.
    pub secure: bool,
    /// Unix expiry seconds; 0 marks a session cookie.
    pub expires: i64,
    pub name: String,
    pub value: String,
}

/// In-memory cookie set backed by a jar file.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    /// Load a jar from `path`. A missing file is an empty jar, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        let cookies = text.lines().filter_map(parse_jar_line).collect();
        Ok(Self { cookies })
    }

    /// Rewrite the jar file at `path` in the same text layout.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = String::from(FILE_HEADER);
        out.push_str("\n\n");
        for c in &self.cookies {
            let domain = if c.include_subdomains {
                format!(".{}", c.domain)
            } else {
                c.domain.clone()
            };
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                domain,
                flag(c.include_subdomains),
                c.path,
                flag(c.secure),
                c.expires,
                c.name,
                c.value
            ));
        }
        fs::write(path, out)?;
        Ok(())
    }

    /// Fold `Set-Cookie` header values from a response into the jar.
    ///
    /// A cookie replaces an existing one with the same name, domain and path.
    /// `request_host` supplies the domain for cookies without a `Domain`
    /// attribute.
    pub fn store_response_cookies<'a>(
        &mut self,
        set_cookie_values: impl IntoIterator<Item = &'a str>,
        request_host: &str,
    ) {
        for value in set_cookie_values {
            if let Some(cookie) = parse_set_cookie(value, request_host) {
                self.insert(cookie);
            }
        }
    }

    fn insert(&mut self, cookie: Cookie) {
        self.cookies.retain(|c| {
            c.name != cookie.name || c.domain != cookie.domain || c.path != cookie.path
        });
        self.cookies.push(cookie);
    }

    /// Assemble the `Cookie` request-header value for a request to `url`:
    /// every unexpired cookie whose domain matches the request host, or
    /// `None` when nothing matches.
    pub fn header_for(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let https = parsed.scheme() == "https";
        let now = Utc::now().timestamp();

        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|c| c.expires == 0 || c.expires > now)
            .filter(|c| !c.secure || https)
            .filter(|c| domain_matches(host, c))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

fn flag(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

fn domain_matches(host: &str, cookie: &Cookie) -> bool {
    host.eq_ignore_ascii_case(&cookie.domain)
        || (cookie.include_subdomains
            && host
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", cookie.domain.to_ascii_lowercase())))
}

/// Parse one jar line. Comments and blank lines yield `None`; curl's
/// `#HttpOnly_` domain prefix is tolerated.
fn parse_jar_line(line: &str) -> Option<Cookie> {
    let line = match line.strip_prefix("#HttpOnly_") {
        Some(rest) => rest,
        None if line.starts_with('#') || line.trim().is_empty() => return None,
        None => line,
    };

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 7 {
        return None;
    }

    let domain = fields[0].trim_start_matches('.');
    Some(Cookie {
        domain: domain.to_string(),
        include_subdomains: fields[1].eq_ignore_ascii_case("TRUE") || fields[0].starts_with('.'),
        path: fields[2].to_string(),
        secure: fields[3].eq_ignore_ascii_case("TRUE"),
        expires: fields[4].parse().unwrap_or(0),
        name: fields[5].to_string(),
        value: fields[6].to_string(),
    })
}

/// Parse a `Set-Cookie` header value. `Max-Age` wins over `Expires`;
/// a `Domain` attribute widens the cookie to subdomains.
fn parse_set_cookie(value: &str, request_host: &str) -> Option<Cookie> {
    let mut parts = value.split(';');
    let (name, val) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie {
        domain: request_host.to_string(),
        include_subdomains: false,
        path: "/".to_string(),
        secure: false,
        expires: 0,
        name: name.to_string(),
        value: val.trim().to_string(),
    };

    let mut max_age = None;
    let mut expires_at = None;

    for attr in parts {
        let (key, attr_val) = match attr.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (attr.trim(), ""),
        };
        match key.to_ascii_lowercase().as_str() {
            "domain" => {
                let d = attr_val.trim_start_matches('.');
                if !d.is_empty() {
                    cookie.domain = d.to_string();
                    cookie.include_subdomains = true;
                }
            }
            "path" => {
                if !attr_val.is_empty() {
                    cookie.path = attr_val.to_string();
                }
            }
            "secure" => cookie.secure = true,
            "max-age" => max_age = attr_val.parse::<i64>().ok(),
            "expires" => expires_at = parse_http_date(attr_val),
            _ => {}
        }
    }

    cookie.expires = match (max_age, expires_at) {
        (Some(secs), _) => Utc::now().timestamp() + secs,
        (None, Some(ts)) => ts,
        (None, None) => 0,
    };

    Some(cookie)
}

fn parse_http_date(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp());
    }
    // older cookie date form, e.g. "Tue, 15-Jan-2030 21:47:38 GMT"
    NaiveDateTime::parse_from_str(s, "%a, %d-%b-%Y %H:%M:%S GMT")
        .ok()
        .map(|naive| naive.and_utc().timestamp())
}
