//! Shipments as served by `/api/v1/shipments`.

use serde::{Deserialize, Serialize};
use sportgear_core::{OrderId, ShipmentId, ShipmentStatus};

use super::{Timestamp, timestamp};

/// A shipment. There is at most one per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub vehicle_info: Option<String>,
    pub status: ShipmentStatus,
    #[serde(default, with = "timestamp")]
    pub estimated_delivery: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub shipped_at: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub delivered_at: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<Timestamp>,
}

/// Body of `POST /api/v1/shipments`.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentDraft {
    pub order_id: OrderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::serialize"
    )]
    pub estimated_delivery: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ShipmentStatus>,
}

impl ShipmentDraft {
    /// Minimal draft for `order_id`; the backend fills in the rest.
    #[must_use]
    pub const fn for_order(order_id: OrderId) -> Self {
        Self {
            order_id,
            tracking_number: None,
            carrier: None,
            vehicle_info: None,
            estimated_delivery: None,
            status: None,
        }
    }
}

/// Body of `PUT /api/v1/shipments/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShipmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ShipmentStatus>,
}

/// Body of `PUT /api/v1/shipments/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipmentStatusUpdate {
    pub status: ShipmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_shipment() {
        let shipment: Shipment = serde_json::from_str(
            r#"{"id": 5, "order_id": 42, "status": "dispatched", "created_at": "2025-03-02T08:00:00"}"#,
        )
        .unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Dispatched);
        assert_eq!(shipment.tracking_number, None);
        assert!(shipment.created_at.is_some());
    }

    #[test]
    fn test_status_update_body() {
        let update = ShipmentStatusUpdate {
            status: ShipmentStatus::InTransit,
            vehicle_info: Some("Truck ABC-123".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"status": "in_transit", "vehicle_info": "Truck ABC-123"})
        );
    }

    #[test]
    fn test_draft_for_order_is_minimal() {
        let draft = ShipmentDraft::for_order(OrderId::new(42));
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            serde_json::json!({"order_id": 42})
        );
    }
}
