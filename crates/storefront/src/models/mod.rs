//! Wire models for the SportGear backends.

pub mod order;
pub mod payment;
pub mod product;
pub mod session;
pub mod shipment;
pub mod user;

pub use order::{Order, OrderDraft, OrderPatch};
pub use payment::{Payment, PaymentDraft, PaymentMethod};
pub use product::{Product, ProductDisplay, ProductDraft, ProductFilters, ProductPatch};
pub use session::{AuthResponse, ProfileResponse, Registration, SessionUser};
pub use shipment::{Shipment, ShipmentDraft, ShipmentPatch, ShipmentStatusUpdate};
pub use user::{ProfileUpdate, User, UserFilters, UserStats};

use chrono::{DateTime, Utc};

/// Timestamp as stored by the client.
pub type Timestamp = DateTime<Utc>;

/// Lenient timestamp (de)serialization.
///
/// The Python services emit naive ISO-8601 (`2025-03-01T10:15:00.123456`),
/// the Java ones RFC 3339. Naive values are taken as UTC. Unparseable values
/// become `None` instead of failing the entity they belong to.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Timestamp;

    pub fn parse(raw: &str) -> Option<Timestamp> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Timestamp>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::timestamp;

    #[test]
    fn test_parse_rfc3339_and_naive() {
        let ts = timestamp::parse("2025-03-01T10:15:00Z").map(|t| (t.day(), t.hour()));
        assert_eq!(ts, Some((1, 10)));

        let ts = timestamp::parse("2025-03-01T10:15:00.123456").map(|t| t.minute());
        assert_eq!(ts, Some(15));

        let ts = timestamp::parse("2025-03-01T12:00:00-03:00").map(|t| t.hour());
        assert_eq!(ts, Some(15));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(timestamp::parse("yesterday").is_none());
    }
}
