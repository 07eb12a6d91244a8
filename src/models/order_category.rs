use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an order is consumed: at a table or packed to go.
///
/// Wire values are `"dineIn"` and `"takeout"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderCategory {
    /// Order served at a table in the restaurant.
    DineIn,
    /// Order packed for pickup.
    Takeout,
}

impl fmt::Display for OrderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderCategory::DineIn => write!(f, "dineIn"),
            OrderCategory::Takeout => write!(f, "takeout"),
        }
    }
}
