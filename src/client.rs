//! Public handle for the order feed connection.
//!
//! [`OrderFeedClient`] is an explicit service object: construct one at
//! application start and share it (`Arc`) with every consumer; there is no
//! process-wide singleton. The handle owns nothing but a command channel to
//! the background connection task and the event bus; dropping the handle
//! shuts the task down.
//!
//! # Example
//!
//! ```rust,no_run
//! use comanda_link::{EventKind, OrderFeedClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OrderFeedClient::builder()
//!     .origin("https://pos.example.com")
//!     .build()?;
//!
//! let _sub = client.subscribe(EventKind::NewOrder, |event| {
//!     println!("order event: {:?}", event);
//! });
//!
//! client.connect("bearer-token").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::connection::{connection_task, ConnCmd, ConnectionShared};
use crate::endpoint::FeedEndpoint;
use crate::error::{ComandaLinkError, Result};
use crate::event_bus::{EventBus, Subscription};
use crate::models::{ConnectionOptions, EventKind, FeedEvent};

/// Capacity of the command channel to the background task.
const CMD_CHANNEL_CAPACITY: usize = 256;

/// Handle to the real-time order event feed.
///
/// All methods are safe to call in any order and any number of times:
/// `connect` on a live connection re-authenticates instead of opening a
/// second handle, and `disconnect` tolerates having nothing to close.
pub struct OrderFeedClient {
    cmd_tx: mpsc::Sender<ConnCmd>,
    bus: EventBus,
    shared: ConnectionShared,
    /// Background task owning the socket; exits when the command channel
    /// closes (i.e. when this handle is dropped).
    _task: JoinHandle<()>,
}

impl OrderFeedClient {
    /// Start building a client.
    pub fn builder() -> OrderFeedClientBuilder {
        OrderFeedClientBuilder::new()
    }

    /// Open the feed with a bearer token.
    ///
    /// If a handle is already live (open or connecting), the auth frame is
    /// re-sent with the new token rather than opening a second handle. The
    /// token is kept for reconnection. An empty token is a no-op: the feed
    /// is never opened without credentials.
    pub async fn connect(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.is_empty() {
            log::debug!("[comanda-link] connect() without a token is a no-op");
            return Ok(());
        }
        self.shared.retry_enabled.store(true, Ordering::SeqCst);
        self.cmd_tx
            .send(ConnCmd::Connect { token })
            .await
            .map_err(|_| {
                ComandaLinkError::WebSocketError("Connection task is not running".to_string())
            })
    }

    /// Close the feed and stop reconnecting.
    ///
    /// Safe to call repeatedly and with no live connection. The pending
    /// reconnect timer (if any) is cancelled: the retry flag is cleared
    /// here, synchronously, before the close command is queued, so a timer
    /// that fires afterwards never re-opens the feed.
    pub async fn disconnect(&self) {
        self.shared.retry_enabled.store(false, Ordering::SeqCst);
        let _ = self.cmd_tx.send(ConnCmd::Disconnect).await;
    }

    /// Register a handler for one event kind.
    ///
    /// Lifecycle kinds (`Connected`, `Disconnected`, `Error`) and broadcast
    /// kinds share the same mechanism; the handler receives the
    /// [`FeedEvent`] and discriminates by kind.
    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&FeedEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.bus.subscribe(kind, handler)
    }

    /// Whether the feed is currently open and authenticated.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Number of reconnect attempts scheduled since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.reconnect_attempts.load(Ordering::SeqCst)
    }

    /// Number of handlers currently subscribed to a kind (diagnostic).
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.bus.subscriber_count(kind)
    }
}

/// Builder for [`OrderFeedClient`].
#[derive(Debug, Clone, Default)]
pub struct OrderFeedClientBuilder {
    endpoint: FeedEndpoint,
    options: ConnectionOptions,
}

impl OrderFeedClientBuilder {
    /// Create a builder with default options and no endpoint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit `ws(s)://` feed URL (takes precedence over origin).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.endpoint = self.endpoint.with_url(url);
        self
    }

    /// Derive the feed address from an `http(s)` origin.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.endpoint = self.endpoint.with_origin(origin);
        self
    }

    /// Override the port used when the origin does not name one.
    pub fn default_port(mut self, port: u16) -> Self {
        self.endpoint = self.endpoint.with_default_port(port);
        self
    }

    /// Replace the endpoint wholesale.
    pub fn endpoint(mut self, endpoint: FeedEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Set connection options (reconnect, keepalive, timeouts).
    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve the endpoint and spawn the background connection task.
    ///
    /// No socket is opened yet; that happens on the first
    /// [`connect`](OrderFeedClient::connect). Must be called from within a
    /// Tokio runtime.
    pub fn build(self) -> Result<OrderFeedClient> {
        let feed_url = self.endpoint.resolve()?;
        let bus = EventBus::new();
        let shared = ConnectionShared::new();
        let (cmd_tx, cmd_rx) = mpsc::channel(CMD_CHANNEL_CAPACITY);

        let task = tokio::spawn(connection_task(
            cmd_rx,
            feed_url,
            self.options,
            bus.clone(),
            shared.clone(),
        ));

        Ok(OrderFeedClient {
            cmd_tx,
            bus,
            shared,
            _task: task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_requires_an_endpoint() {
        assert!(OrderFeedClient::builder().build().is_err());
    }

    #[tokio::test]
    async fn test_build_does_not_open_a_socket() {
        let client = OrderFeedClient::builder()
            .url("ws://127.0.0.1:1")
            .build()
            .unwrap();
        assert!(!client.is_connected());
        assert_eq!(client.reconnect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_connect_with_empty_token_is_a_no_op() {
        let client = OrderFeedClient::builder()
            .url("ws://127.0.0.1:1")
            .build()
            .unwrap();
        client.connect("").await.unwrap();
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_without_a_connection_is_a_no_op() {
        let client = OrderFeedClient::builder()
            .url("ws://127.0.0.1:1")
            .build()
            .unwrap();
        client.disconnect().await;
        client.disconnect().await;
        assert!(!client.is_connected());
    }
}
