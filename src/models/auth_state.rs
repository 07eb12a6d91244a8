use serde::{Deserialize, Serialize};

/// Current authentication state observed by the [`SessionBinder`].
///
/// The binder reacts to changes in this pair: a present token with a
/// privileged role opens the feed, anything else closes it.
///
/// [`SessionBinder`]: crate::session::SessionBinder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    /// Bearer token used for the feed's auth handshake.
    pub token: String,
    /// Role string as reported by the authentication provider.
    pub role: String,
}

impl AuthState {
    /// Create an auth state from a token and role pair.
    pub fn new(token: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            role: role.into(),
        }
    }
}
