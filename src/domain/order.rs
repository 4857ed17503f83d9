//! Order wire model
//!
//! Orders arrive from the storefront API as JSON; only the fields the
//! analytics core reads are modeled here. `created_at` is a string of
//! milliseconds since the Unix epoch, not a date string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A customer purchase record progressing through the fulfillment lifecycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Milliseconds since the Unix epoch, encoded as a string.
    pub created_at: String,
    pub status: OrderStatus,
    pub checkout: Checkout,
}

/// Financial sub-record attached to an order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub total: f64,
    #[serde(default)]
    pub free_delivery: bool,
}

/// Order lifecycle status.
///
/// Wire values outside the known set are preserved as [`OrderStatus::Other`]
/// so a status added server-side shows up under its own key in tallies
/// instead of breaking deserialization.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Processing,
    Confirmed,
    TransferredToCarrier,
    PayedAndDelivered,
    PayedNotDelivered,
    Cancelled,
    Refunded,
    Returned,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Confirmed => "CONFIRMED",
            Self::TransferredToCarrier => "TRANSFERRED_TO_CARRIER",
            Self::PayedAndDelivered => "PAYED_AND_DELIVERED",
            Self::PayedNotDelivered => "PAYED_NOT_DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
            Self::Returned => "RETURNED",
            Self::Other(raw) => raw,
        }
    }

    /// Terminal non-revenue statuses, omitted from every rollup.
    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded | Self::Returned)
    }

    /// Human label for dashboard cards and tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Confirmed => "Confirmed",
            Self::TransferredToCarrier => "Transferred to carrier",
            Self::PayedAndDelivered => "Paid and delivered",
            Self::PayedNotDelivered => "Paid, not delivered",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
            Self::Returned => "Returned",
            Self::Other(_) => "Unknown",
        }
    }

    /// Badge color used by the dashboard next to the label.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Processing => "#F59E0B",
            Self::Confirmed => "#3B82F6",
            Self::TransferredToCarrier => "#06B6D4",
            Self::PayedAndDelivered => "#10B981",
            Self::PayedNotDelivered => "#84CC16",
            Self::Cancelled => "#EF4444",
            Self::Refunded => "#8B5CF6",
            Self::Returned => "#EC4899",
            Self::Other(_) => "#6B7280",
        }
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PROCESSING" => Self::Processing,
            "CONFIRMED" => Self::Confirmed,
            "TRANSFERRED_TO_CARRIER" => Self::TransferredToCarrier,
            "PAYED_AND_DELIVERED" => Self::PayedAndDelivered,
            "PAYED_NOT_DELIVERED" => Self::PayedNotDelivered,
            "CANCELLED" => Self::Cancelled,
            "REFUNDED" => Self::Refunded,
            "RETURNED" => Self::Returned,
            _ => Self::Other(raw),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
