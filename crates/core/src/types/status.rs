//! Status enums reported by WooCommerce.

use serde::{Deserialize, Serialize};

/// Product or variation stock status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    #[default]
    InStock,
    OutOfStock,
    OnBackorder,
}

impl StockStatus {
    /// Whether the item can be added to a cart.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        matches!(self, Self::InStock | Self::OnBackorder)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InStock => "In stock",
            Self::OutOfStock => "Out of stock",
            Self::OnBackorder => "Available on backorder",
        }
    }

    /// Parse the WooGraphQL enum form (`IN_STOCK`) or the REST form (`instock`).
    #[must_use]
    pub fn from_api(value: &str) -> Self {
        match value.to_ascii_lowercase().replace('_', "").as_str() {
            "outofstock" => Self::OutOfStock,
            "onbackorder" => Self::OnBackorder,
            _ => Self::InStock,
        }
    }
}

/// Order status.
///
/// Plugins can register custom statuses; those deserialize to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
    CheckoutDraft,
    #[serde(other)]
    Other,
}

impl OrderStatus {
    /// Whether the order still awaits payment.
    #[must_use]
    pub const fn needs_payment(&self) -> bool {
        matches!(self, Self::Pending | Self::Failed | Self::CheckoutDraft)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_status_serde() {
        let status: StockStatus = serde_json::from_str("\"onbackorder\"").unwrap();
        assert_eq!(status, StockStatus::OnBackorder);
        assert_eq!(
            serde_json::to_string(&StockStatus::OutOfStock).unwrap(),
            "\"outofstock\""
        );
    }

    #[test]
    fn test_stock_status_from_api() {
        assert_eq!(StockStatus::from_api("OUT_OF_STOCK"), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_api("instock"), StockStatus::InStock);
        assert!(StockStatus::from_api("ON_BACKORDER").is_purchasable());
        assert!(!StockStatus::OutOfStock.is_purchasable());
    }

    #[test]
    fn test_order_status_unknown_is_other() {
        let status: OrderStatus = serde_json::from_str("\"awaiting-shipment\"").unwrap();
        assert_eq!(status, OrderStatus::Other);
        let status: OrderStatus = serde_json::from_str("\"on-hold\"").unwrap();
        assert_eq!(status, OrderStatus::OnHold);
        assert!(OrderStatus::Pending.needs_payment());
    }
}
