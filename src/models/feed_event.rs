use super::broadcast_event::BroadcastEvent;
use super::connection_error::ConnectionError;
use super::disconnect_reason::DisconnectReason;
use super::event_kind::EventKind;

/// Everything the event bus can deliver: lifecycle pseudo-events and domain
/// broadcast events share the same subscription mechanism but carry
/// different payload shapes, so subscribers discriminate by [`kind`].
///
/// [`kind`]: FeedEvent::kind
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// The connection opened and the auth frame was sent.
    Connected,
    /// The connection closed, cleanly or not.
    Disconnected(DisconnectReason),
    /// A transport error occurred; the connection may still close separately.
    Error(ConnectionError),
    /// A domain broadcast event decoded from an inbound frame.
    Broadcast(BroadcastEvent),
}

impl FeedEvent {
    /// The registry kind this event is dispatched under.
    pub fn kind(&self) -> EventKind {
        match self {
            FeedEvent::Connected => EventKind::Connected,
            FeedEvent::Disconnected(_) => EventKind::Disconnected,
            FeedEvent::Error(_) => EventKind::Error,
            FeedEvent::Broadcast(event) => event.kind(),
        }
    }

    /// The broadcast payload, when this is a domain event.
    pub fn as_broadcast(&self) -> Option<&BroadcastEvent> {
        match self {
            FeedEvent::Broadcast(event) => Some(event),
            _ => None,
        }
    }
}
