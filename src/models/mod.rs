//! Data models for the comanda-link client library.
//!
//! Defines the wire frames exchanged over the feed connection, the typed
//! broadcast event set, lifecycle event payloads, and client configuration.

pub mod auth_state;
pub mod broadcast_event;
pub mod cache_domain;
pub mod client_frame;
pub mod connection_error;
pub mod connection_options;
pub mod disconnect_reason;
pub mod event_kind;
pub mod feed_event;
pub mod order_category;

pub use auth_state::AuthState;
pub use broadcast_event::BroadcastEvent;
pub use cache_domain::CacheDomain;
pub use client_frame::ClientFrame;
pub use connection_error::ConnectionError;
pub use connection_options::ConnectionOptions;
pub use disconnect_reason::DisconnectReason;
pub use event_kind::EventKind;
pub use feed_event::FeedEvent;
pub use order_category::OrderCategory;
