//! Order lifecycle status.
//!
//! The storefront frontend speaks Indonesian status labels, so those are the
//! canonical wire and storage values. English names are accepted on input.

use serde::{Deserialize, Serialize};

/// Error returned when a status label is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order status: {0}")]
pub struct OrderStatusParseError(pub String);

/// Status of an order.
///
/// | Variant | Wire value | Also accepted |
/// |---|---|---|
/// | `Pending` | `Pending` | |
/// | `Processing` | `Diproses` | `Processing` |
/// | `Shipped` | `Dikirim` | `Shipped` |
/// | `Completed` | `Selesai` | `Completed` |
/// | `Cancelled` | `Batal` | `Cancelled` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
pub enum OrderStatus {
    /// Created at checkout, awaiting payment.
    #[default]
    Pending,
    #[serde(rename = "Diproses", alias = "Processing")]
    #[cfg_attr(feature = "sqlite", sqlx(rename = "Diproses"))]
    Processing,
    #[serde(rename = "Dikirim", alias = "Shipped")]
    #[cfg_attr(feature = "sqlite", sqlx(rename = "Dikirim"))]
    Shipped,
    #[serde(rename = "Selesai", alias = "Completed")]
    #[cfg_attr(feature = "sqlite", sqlx(rename = "Selesai"))]
    Completed,
    #[serde(rename = "Batal", alias = "Cancelled")]
    #[cfg_attr(feature = "sqlite", sqlx(rename = "Batal"))]
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Canonical wire/storage label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Diproses",
            Self::Shipped => "Dikirim",
            Self::Completed => "Selesai",
            Self::Cancelled => "Batal",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(Self::Pending),
            "Diproses" | "Processing" => Ok(Self::Processing),
            "Dikirim" | "Shipped" => Ok(Self::Shipped),
            "Selesai" | "Completed" => Ok(Self::Completed),
            "Batal" | "Cancelled" => Ok(Self::Cancelled),
            other => Err(OrderStatusParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_labels() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"Diproses\""
        );
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_english_aliases_accepted() {
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"Shipped\"").unwrap(),
            OrderStatus::Shipped
        );
        assert_eq!("Cancelled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_unknown_label_rejected() {
        assert_eq!(
            "Lost".parse::<OrderStatus>(),
            Err(OrderStatusParseError("Lost".to_owned()))
        );
        assert!(serde_json::from_str::<OrderStatus>("\"pending\"").is_err());
    }
}
