use serde::{Deserialize, Serialize};

/// Client-to-server frames sent over the feed connection.
///
/// The feed protocol has a single outbound message: the authentication
/// frame, sent immediately after the WebSocket opens (and re-sent when
/// `connect` is called with a new token while the handle is live).
///
/// # JSON wire format
///
/// ```json
/// {"type": "auth", "token": "<bearer token>"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Authenticate the connection with a bearer token.
    Auth {
        /// Bearer token issued by the authentication provider.
        token: String,
    },
}
