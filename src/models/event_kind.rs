use std::fmt;

/// The closed set of event kinds the feed can deliver.
///
/// Broadcast kinds correspond one-to-one to inbound wire `type` names;
/// lifecycle kinds (`Connected`, `Disconnected`, `Error`) are synthesized
/// locally by the connection and never arrive on the wire, which is why
/// [`EventKind::from_wire_name`] does not resolve them.
///
/// Decoding never accepts a wire name outside the broadcast set: unknown
/// names are dropped with a warning before they reach the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Connection established and auth frame sent.
    Connected,
    /// Connection closed (clean or unclean).
    Disconnected,
    /// Transport-level error (non-fatal on its own).
    Error,
    /// A new order was created.
    NewOrder,
    /// An item was added to an existing order.
    NewItem,
    /// An order's fields were updated.
    OrderUpdated,
    /// An order was deleted.
    DeleteOrder,
    /// A single item was removed from an order.
    DeleteOrderItem,
    /// An item's served flag was toggled.
    ItemServed,
    /// An order's payment flag was toggled.
    OrderPaid,
    /// An order was completed.
    OrderCompleted,
}

impl EventKind {
    /// All broadcast (wire-deliverable) kinds, in registry order.
    pub const BROADCAST: [EventKind; 8] = [
        EventKind::NewOrder,
        EventKind::NewItem,
        EventKind::OrderUpdated,
        EventKind::DeleteOrder,
        EventKind::DeleteOrderItem,
        EventKind::ItemServed,
        EventKind::OrderPaid,
        EventKind::OrderCompleted,
    ];

    /// The wire/diagnostic name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::Disconnected => "disconnected",
            EventKind::Error => "error",
            EventKind::NewOrder => "newOrder",
            EventKind::NewItem => "newItem",
            EventKind::OrderUpdated => "orderUpdated",
            EventKind::DeleteOrder => "deleteOrder",
            EventKind::DeleteOrderItem => "deleteOrderItem",
            EventKind::ItemServed => "itemServed",
            EventKind::OrderPaid => "orderPaid",
            EventKind::OrderCompleted => "orderCompleted",
        }
    }

    /// Resolve an inbound wire `type` name against the broadcast registry.
    ///
    /// Returns `None` for anything outside the closed set, including the
    /// lifecycle names, which are local pseudo-events rather than wire frames.
    pub fn from_wire_name(name: &str) -> Option<EventKind> {
        match name {
            "newOrder" => Some(EventKind::NewOrder),
            "newItem" => Some(EventKind::NewItem),
            "orderUpdated" => Some(EventKind::OrderUpdated),
            "deleteOrder" => Some(EventKind::DeleteOrder),
            "deleteOrderItem" => Some(EventKind::DeleteOrderItem),
            "itemServed" => Some(EventKind::ItemServed),
            "orderPaid" => Some(EventKind::OrderPaid),
            "orderCompleted" => Some(EventKind::OrderCompleted),
            _ => None,
        }
    }

    /// Whether this kind is a wire-deliverable broadcast event.
    pub fn is_broadcast(&self) -> bool {
        !matches!(
            self,
            EventKind::Connected | EventKind::Disconnected | EventKind::Error
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
