//! Session state on local disk
//!
//! One storage directory holds everything a login leaves behind: the cookie
//! jar and a plaintext username marker. Presence of either does not
//! guarantee the server still honors the session; `AuthClient::is_authenticated`
//! is the only staleness check.
//!
//! The files are shared across invocations of the tool with no locking.
//! Concurrent runs race and the last writer wins.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

const COOKIE_FILE: &str = "hatena.cookie";
const USERNAME_FILE: &str = "username";

/// Handle on the session storage directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
    jar_path: PathBuf,
    username_path: PathBuf,
}

impl SessionStore {
    pub fn new(root: PathBuf) -> Self {
        let jar_path = root.join(COOKIE_FILE);
        let username_path = root.join(USERNAME_FILE);
        Self {
            root,
            jar_path,
            username_path,
        }
    }

    /// Ensure the storage directory exists. Idempotent.
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Remove all persisted session state. Idempotent: a missing directory
    /// is a no-op, not an error.
    pub fn destroy(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the authenticated username.
    pub fn save_username(&self, name: &str) -> Result<()> {
        self.init()?;
        fs::write(&self.username_path, name)?;
        Ok(())
    }

    /// The persisted username, or `None` when no login is stored.
    pub fn load_username(&self) -> Option<String> {
        let name = fs::read_to_string(&self.username_path).ok()?;
        let name = name.trim_end_matches('\n').to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Stable cookie-jar location used for every outgoing request.
    pub fn cookie_jar_path(&self) -> &Path {
        &self.jar_path
    }
}
