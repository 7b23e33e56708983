//! Client error kinds
//!
//! Only hard failures live here. A rejected login is a clean `Ok(false)`,
//! a missing confirmation field is an absent `Option` in the confirmation,
//! and a rejected submission is the `fail?` sentinel outcome.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure. Fatal to the current call, never retried.
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// Session state on disk could not be read or written.
    #[error("session storage: {0}")]
    Storage(#[from] std::io::Error),

    /// The confirmation page did not yield a required hidden field, so the
    /// submission was not sent.
    #[error("confirmation page is missing the `{0}` field")]
    MissingField(&'static str),
}
