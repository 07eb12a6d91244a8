use serde::{Deserialize, Serialize};

use super::event_kind::EventKind;
use super::order_category::OrderCategory;

/// Server-to-client broadcast events, one variant per recognized wire type.
///
/// The wire shape is `{"type": "<name>", "data": {...}}`; the enum is
/// adjacently tagged so serializing a variant reproduces exactly that shape.
/// Every payload carries the order identifier; display code, category and
/// the type-specific fields are optional because staff clients may receive
/// trimmed payloads for orders they did not originate.
///
/// Deserialization of the full frame goes through
/// [`decode_frame`](crate::decoder::decode_frame), which defaults a missing
/// `data` object and classifies unknown type names before this enum is
/// constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum BroadcastEvent {
    /// A new order was created.
    #[serde(rename_all = "camelCase")]
    NewOrder {
        /// Identifier of the order.
        order_id: String,
        /// Short display code shown to staff (e.g. `"D-05-012"`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order_code: Option<String>,
        /// Dine-in or takeout.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<OrderCategory>,
    },

    /// An item was added to an existing order.
    #[serde(rename_all = "camelCase")]
    NewItem {
        order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<OrderCategory>,
        /// Code of the affected item line.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_code: Option<String>,
    },

    /// An order's fields were updated.
    #[serde(rename_all = "camelCase")]
    OrderUpdated {
        order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<OrderCategory>,
        /// Server-side update timestamp (ISO-8601).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        updated_at: Option<String>,
    },

    /// An order was deleted.
    #[serde(rename_all = "camelCase")]
    DeleteOrder {
        order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<OrderCategory>,
        /// Free-text deletion reason entered by staff.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// A single item was removed from an order.
    #[serde(rename_all = "camelCase")]
    DeleteOrderItem {
        order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<OrderCategory>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_code: Option<String>,
    },

    /// An item's served flag was toggled.
    #[serde(rename_all = "camelCase")]
    ItemServed {
        order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<OrderCategory>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_code: Option<String>,
        /// New served state of the item.
        #[serde(default)]
        is_served: bool,
    },

    /// An order's payment flag was toggled.
    #[serde(rename_all = "camelCase")]
    OrderPaid {
        order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<OrderCategory>,
        /// New payment state of the order.
        #[serde(default)]
        is_paid: bool,
    },

    /// An order was completed and archived.
    #[serde(rename_all = "camelCase")]
    OrderCompleted {
        order_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<OrderCategory>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        updated_at: Option<String>,
    },
}

impl BroadcastEvent {
    /// The registry kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            BroadcastEvent::NewOrder { .. } => EventKind::NewOrder,
            BroadcastEvent::NewItem { .. } => EventKind::NewItem,
            BroadcastEvent::OrderUpdated { .. } => EventKind::OrderUpdated,
            BroadcastEvent::DeleteOrder { .. } => EventKind::DeleteOrder,
            BroadcastEvent::DeleteOrderItem { .. } => EventKind::DeleteOrderItem,
            BroadcastEvent::ItemServed { .. } => EventKind::ItemServed,
            BroadcastEvent::OrderPaid { .. } => EventKind::OrderPaid,
            BroadcastEvent::OrderCompleted { .. } => EventKind::OrderCompleted,
        }
    }

    /// The identifier of the order this event concerns.
    pub fn order_id(&self) -> &str {
        match self {
            BroadcastEvent::NewOrder { order_id, .. }
            | BroadcastEvent::NewItem { order_id, .. }
            | BroadcastEvent::OrderUpdated { order_id, .. }
            | BroadcastEvent::DeleteOrder { order_id, .. }
            | BroadcastEvent::DeleteOrderItem { order_id, .. }
            | BroadcastEvent::ItemServed { order_id, .. }
            | BroadcastEvent::OrderPaid { order_id, .. }
            | BroadcastEvent::OrderCompleted { order_id, .. } => order_id,
        }
    }
}
