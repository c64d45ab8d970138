// User session collaborator
// Supplies the logged-in user and auth token reported to the host at
// startup and performs session termination on the host's behalf

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// The logged-in user as reported to the host via `user-auth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display_name: Option<String>,
}

/// Narrow interface over the client's user session subsystem.
pub trait UserSession: Send + Sync {
    /// The current user, if anyone is logged in
    fn current_user(&self) -> Option<User>;
    /// The OAuth token for the current session, if any
    fn oauth_token(&self) -> Option<String>;
    /// Terminate the session
    fn logout(&self);
}

/// Fixed-credential session used in tests and small embedders.
#[derive(Default)]
pub struct StaticSession {
    user: Option<User>,
    token: Option<String>,
    logged_out: Mutex<bool>,
}

impl StaticSession {
    /// A session with nobody logged in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn logged_in(user: User, token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            token: Some(token.into()),
            logged_out: Mutex::new(false),
        }
    }

    /// Whether `logout` has been invoked.
    pub fn was_logged_out(&self) -> bool {
        *self.logged_out.lock().unwrap()
    }
}

impl UserSession for StaticSession {
    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }

    fn oauth_token(&self) -> Option<String> {
        self.token.clone()
    }

    fn logout(&self) {
        tracing::debug!("terminating user session");
        *self.logged_out.lock().unwrap() = true;
    }
}
