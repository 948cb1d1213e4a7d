//! Payments as served by `/api/v1/payments`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use sportgear_core::{Money, OrderId, PaymentId, PaymentStatus};

/// Payment method offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    DebitCard,
    Paypal,
    BankTransfer,
    #[serde(other)]
    Other,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Paypal => "paypal",
            Self::BankTransfer => "bank_transfer",
            Self::Other => "other",
        }
    }

    /// Card methods collect card details before payment.
    #[must_use]
    pub const fn is_card(self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "credit_card" => Ok(Self::CreditCard),
            "debit_card" => Ok(Self::DebitCard),
            "paypal" => Ok(Self::Paypal),
            "bank_transfer" => Ok(Self::BankTransfer),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// A payment against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Money,
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: PaymentStatus,
}

/// Body of `POST /api/v1/payments`.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentDraft {
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Money,
    pub method: PaymentMethod,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!("paypal".parse::<PaymentMethod>().unwrap(), PaymentMethod::Paypal);
        assert_eq!(
            "bank-transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert!("cash".parse::<PaymentMethod>().is_err());
        assert!(PaymentMethod::DebitCard.is_card());
        assert!(!PaymentMethod::Paypal.is_card());
    }

    #[test]
    fn test_unknown_method_and_missing_status() {
        let payment: Payment = serde_json::from_str(
            r#"{"id": 3, "order_id": 42, "amount": 55000, "method": "crypto"}"#,
        )
        .unwrap();
        assert_eq!(payment.method, PaymentMethod::Other);
        assert_eq!(payment.status, PaymentStatus::Pending);
    }
}
