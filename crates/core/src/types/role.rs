//! User roles and account statuses issued by the auth service.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role attached to every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Shopper. Also the fallback whenever a role cannot be determined.
    #[default]
    Customer,
    /// Creates shipments and moves them through the delivery progression.
    LogisticsOperator,
    /// Manages catalog, orders and customer accounts.
    StoreAdmin,
    /// Reviews payments and revenue.
    FinanceManager,
    /// Full access, including role assignment.
    SystemAdmin,
}

impl Role {
    /// Every role, in the order the admin screens list them.
    pub const ALL: [Self; 5] = [
        Self::Customer,
        Self::LogisticsOperator,
        Self::StoreAdmin,
        Self::FinanceManager,
        Self::SystemAdmin,
    ];

    /// Wire spelling of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::LogisticsOperator => "LOGISTICS_OPERATOR",
            Self::StoreAdmin => "STORE_ADMIN",
            Self::FinanceManager => "FINANCE_MANAGER",
            Self::SystemAdmin => "SYSTEM_ADMIN",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::LogisticsOperator => "Logistics operator",
            Self::StoreAdmin => "Store admin",
            Self::FinanceManager => "Finance manager",
            Self::SystemAdmin => "System admin",
        }
    }

    /// Parse a role, falling back to [`Role::Customer`] on anything unknown.
    #[must_use]
    pub fn parse_or_customer(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(Self::Customer),
            "LOGISTICS_OPERATOR" => Ok(Self::LogisticsOperator),
            "STORE_ADMIN" => Ok(Self::StoreAdmin),
            "FINANCE_MANAGER" => Ok(Self::FinanceManager),
            "SYSTEM_ADMIN" => Ok(Self::SystemAdmin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Account status managed from the user administration screen.
///
/// Statuses this client does not know decode as `Unknown`, so one odd
/// account does not fail a whole user listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Pending,
    Suspended,
    #[serde(other)]
    Unknown,
}

impl AccountStatus {
    /// Wire spelling of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Pending => "PENDING",
            Self::Suspended => "SUSPENDED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// The status the activate/deactivate toggle moves to.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive | Self::Pending | Self::Suspended | Self::Unknown => Self::Active,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            "PENDING" => Ok(Self::Pending),
            "SUSPENDED" => Ok(Self::Suspended),
            _ => Err(format!("invalid account status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrips_through_wire_spelling() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_parse_or_customer_fails_soft() {
        assert_eq!(Role::parse_or_customer("store_admin"), Role::StoreAdmin);
        assert_eq!(Role::parse_or_customer("OWNER"), Role::Customer);
        assert_eq!(Role::parse_or_customer(""), Role::Customer);
    }

    #[test]
    fn test_account_status_toggle() {
        assert_eq!(AccountStatus::Active.toggled(), AccountStatus::Inactive);
        assert_eq!(AccountStatus::Suspended.toggled(), AccountStatus::Active);
        assert_eq!(AccountStatus::Unknown.toggled(), AccountStatus::Active);
    }

    #[test]
    fn test_unknown_account_status_decodes_leniently() {
        let status: AccountStatus = serde_json::from_str("\"LOCKED\"").unwrap();
        assert_eq!(status, AccountStatus::Unknown);
        let status: AccountStatus = serde_json::from_str("\"SUSPENDED\"").unwrap();
        assert_eq!(status, AccountStatus::Suspended);
        assert!("LOCKED".parse::<AccountStatus>().is_err());
    }
}
