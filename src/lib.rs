//! hatebu: command-line Hatena Bookmark client
//!
//! The service exposes HTML pages rather than a structured API; logging in,
//! checking the session and bookmarking all work by scraping fixed markers
//! out of those pages.
//!
//! Modules:
//! - extract: field extraction from service HTML
//! - cookies: Netscape cookie-jar persistence
//! - session: on-disk session state
//! - auth: login and authentication-status queries
//! - bookmark: the two-phase confirm/submit protocol

pub mod auth;
pub mod bookmark;
pub mod config;
pub mod cookies;
pub mod error;
pub mod extract;
pub mod session;

pub use auth::AuthClient;
pub use bookmark::{BookmarkClient, BookmarkConfirmation, BookmarkOutcome, FAIL_SENTINEL};
pub use config::Config;
pub use cookies::CookieJar;
pub use error::{Error, Result};
pub use session::SessionStore;
