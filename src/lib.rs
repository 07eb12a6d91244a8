//! # comanda-link: Comanda Order Feed Client
//!
//! Client library for the Comanda restaurant platform's real-time order
//! event feed. Maintains one persistent WebSocket connection that
//! authenticates with a bearer token, decodes typed broadcast events about
//! order state changes, and fans them out to in-process subscribers.
//!
//! ## Features
//!
//! - **Typed events**: the closed broadcast set is a tagged union decoded
//!   exhaustively at the wire boundary; unknown or malformed frames are
//!   logged and dropped without touching the connection
//! - **Automatic reconnection**: exponential backoff (1s doubling to a 30s
//!   ceiling), silent and indefinite until an explicit disconnect
//! - **Typed pub/sub**: per-event-kind subscriptions with RAII unsubscribe
//!   handles; lifecycle events (`connected`/`disconnected`/`error`) share
//!   the same mechanism as domain events
//! - **Session binding**: reacts to authentication state and drives query
//!   cache invalidation per event kind
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use comanda_link::{EventKind, FeedEvent, OrderFeedClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OrderFeedClient::builder()
//!         .origin("https://pos.example.com")
//!         .build()?;
//!
//!     let _orders = client.subscribe(EventKind::NewOrder, |event| {
//!         if let FeedEvent::Broadcast(order) = event {
//!             println!("new order: {}", order.order_id());
//!         }
//!     });
//!
//!     client.connect("bearer-token").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Session binding
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use comanda_link::{AuthState, CacheDomain, OrderFeedClient, QueryCache, SessionBinder};
//!
//! struct AppCache;
//! impl QueryCache for AppCache {
//!     fn invalidate(&self, domain: CacheDomain) {
//!         println!("invalidate {}", domain);
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(OrderFeedClient::builder().origin("http://localhost").build()?);
//! let binder = SessionBinder::new(client, Arc::new(AppCache));
//!
//! // Signed in as staff: feed opens, cache refresh subscriptions attach.
//! binder.apply_auth_state(Some(&AuthState::new("token", "staff"))).await;
//!
//! // Logout: everything unsubscribes and the feed closes.
//! binder.apply_auth_state(None).await;
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod client;
mod connection;
pub mod decoder;
pub mod endpoint;
pub mod error;
pub mod event_bus;
pub mod models;
pub mod session;

// Re-export main types for convenience
pub use backoff::ReconnectPolicy;
pub use client::{OrderFeedClient, OrderFeedClientBuilder};
pub use decoder::{decode_frame, DecodeError};
pub use endpoint::{FeedEndpoint, DEFAULT_FEED_PORT};
pub use error::{ComandaLinkError, Result};
pub use event_bus::{EventBus, EventHandler, Subscription};
pub use models::{
    AuthState, BroadcastEvent, CacheDomain, ClientFrame, ConnectionError, ConnectionOptions,
    DisconnectReason, EventKind, FeedEvent, OrderCategory,
};
pub use session::{refresh_domains, QueryCache, SessionBinder, DEFAULT_PRIVILEGED_ROLES};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
