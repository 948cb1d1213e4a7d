//! Orders as served by `/api/v1/orders`.

use serde::{Deserialize, Serialize};
use sportgear_core::{Money, OrderId, OrderStatus, UserId};

use super::{Timestamp, timestamp};

/// An order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Money,
    pub status: OrderStatus,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<Timestamp>,
}

/// Body of `POST /api/v1/orders`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDraft {
    pub user_id: UserId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
}

/// Body of `PUT /api/v1/orders/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub total: Option<Money>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_deserialize_backend_order() {
        let json = r#"{
            "id": 42,
            "user_id": "5f0c2a9e-1d7b-4c1e-9b55-0a4d3f1e2b77",
            "total": 150000.0,
            "status": "in_transit",
            "shipping_address": "Calle 10 #20-30, Bogotá",
            "created_at": "2025-03-01T10:15:00.123456",
            "updated_at": null
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, OrderId::new(42));
        assert_eq!(order.total, Decimal::new(150_000, 0));
        assert_eq!(order.status, OrderStatus::InTransit);
        assert!(order.created_at.is_some());
        assert!(order.updated_at.is_none());
    }

    #[test]
    fn test_deserialize_order_with_integer_owner() {
        let json = r#"{"id": 42, "user_id": 7, "total": 150000.0, "status": "pending"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.user_id, UserId::from("7"));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_patch_only_sends_set_fields() {
        let patch = OrderPatch {
            status: Some(OrderStatus::Processing),
            ..OrderPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"status": "processing"})
        );
    }

    #[test]
    fn test_draft_sends_total_as_number() {
        let draft = OrderDraft {
            user_id: UserId::from("u-1"),
            total: Decimal::new(55_000, 0),
            shipping_address: None,
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert!(value["total"].is_number());
        assert!(value.get("shipping_address").is_none());
    }
}
