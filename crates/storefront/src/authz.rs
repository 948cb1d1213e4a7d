//! Role-based authorization.
//!
//! Every permission check goes through [`can`]. The view router ([`guard`])
//! and individual actions (cancel an order, advance a shipment, ...) both
//! consult it, fed by the role the [`SessionStore`] reports.

use std::fmt;
use std::str::FromStr;

use sportgear_core::Role;
use thiserror::Error;

use crate::session::SessionStore;

/// Who is looking at the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Signed(Role),
}

impl Viewer {
    /// The viewer behind `session`. Signed-in users whose role cannot be
    /// read are treated as customers.
    #[must_use]
    pub fn of(session: &SessionStore) -> Self {
        if session.is_authenticated() {
            Self::Signed(session.role())
        } else {
            Self::Anonymous
        }
    }

    #[must_use]
    pub const fn role(self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::Signed(role) => Some(role),
        }
    }
}

/// Something a viewer may or may not do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Place an order from the cart.
    Checkout,
    /// Cancel one of the viewer's own orders.
    CancelOrder,
    /// See the admin dashboard with store-wide figures.
    ViewAdminDashboard,
    /// List accounts, change their status and see account statistics.
    ManageUsers,
    /// Change the role of an account.
    AssignRoles,
    /// Create, edit and delete catalog products.
    ManageProducts,
    /// See every order and change order status.
    ManageOrders,
    /// Create shipments and move them along.
    ManageShipments,
    AdvanceShipment,
}

const ADMINS: &[Role] = &[Role::StoreAdmin, Role::SystemAdmin];
const OPERATORS: &[Role] = &[Role::LogisticsOperator, Role::StoreAdmin, Role::SystemAdmin];

impl Action {
    /// Roles allowed to perform the action, or `None` if any signed-in user
    /// may.
    #[must_use]
    pub const fn allowed_roles(self) -> Option<&'static [Role]> {
        match self {
            Self::Checkout | Self::CancelOrder => None,
            Self::ViewAdminDashboard | Self::ManageUsers | Self::ManageProducts => Some(ADMINS),
            Self::AssignRoles => Some(&[Role::SystemAdmin]),
            Self::ManageOrders | Self::ManageShipments | Self::AdvanceShipment => Some(OPERATORS),
        }
    }
}

/// Whether `viewer` may perform `action`. Anonymous viewers may perform
/// nothing.
#[must_use]
pub fn can(viewer: Viewer, action: Action) -> bool {
    let Some(role) = viewer.role() else {
        return false;
    };
    action.allowed_roles().is_none_or(|roles| roles.contains(&role))
}

/// A screen of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Catalog,
    Cart,
    Login,
    Register,
    Dashboard,
    Orders,
    Checkout,
    Profile,
    AdminDashboard,
    UserManagement,
    ProductManagement,
    OrderManagement,
    ShipmentManagement,
}

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Requires(Action),
}

impl Route {
    pub const ALL: [Self; 14] = [
        Self::Home,
        Self::Catalog,
        Self::Cart,
        Self::Login,
        Self::Register,
        Self::Dashboard,
        Self::Orders,
        Self::Checkout,
        Self::Profile,
        Self::AdminDashboard,
        Self::UserManagement,
        Self::ProductManagement,
        Self::OrderManagement,
        Self::ShipmentManagement,
    ];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Catalog => "/products",
            Self::Cart => "/cart",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::Orders => "/orders",
            Self::Checkout => "/checkout",
            Self::Profile => "/profile",
            Self::AdminDashboard => "/admin/dashboard",
            Self::UserManagement => "/admin/users",
            Self::ProductManagement => "/admin/products",
            Self::OrderManagement => "/admin/orders",
            Self::ShipmentManagement => "/admin/shipments",
        }
    }

    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Home | Self::Catalog | Self::Cart | Self::Login | Self::Register => Access::Public,
            Self::Dashboard | Self::Orders | Self::Profile => Access::Authenticated,
            Self::Checkout => Access::Requires(Action::Checkout),
            Self::AdminDashboard => Access::Requires(Action::ViewAdminDashboard),
            Self::UserManagement => Access::Requires(Action::ManageUsers),
            Self::ProductManagement => Access::Requires(Action::ManageProducts),
            Self::OrderManagement => Access::Requires(Action::ManageOrders),
            Self::ShipmentManagement => Access::Requires(Action::ManageShipments),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Error)]
#[error("Unknown route: {0}")]
pub struct UnknownRoute(String);

impl FromStr for Route {
    type Err = UnknownRoute;

    /// Accepts the path with or without its leading slash, ignoring a
    /// trailing slash.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('/');
        let path = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        Self::ALL
            .into_iter()
            .find(|route| route.path() == path)
            .ok_or_else(|| UnknownRoute(s.to_string()))
    }
}

/// Outcome of routing a viewer to a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToLogin,
    /// Show the access-denied view, offering a way back to `fallback`.
    Denied { fallback: Route },
}

/// Decide whether `viewer` may open `route`.
#[must_use]
pub fn decide(route: Route, viewer: Viewer) -> Decision {
    match (route.access(), viewer) {
        (Access::Public, _) => Decision::Allow,
        (_, Viewer::Anonymous) => Decision::RedirectToLogin,
        (Access::Authenticated, Viewer::Signed(_)) => Decision::Allow,
        (Access::Requires(action), viewer) => {
            if can(viewer, action) {
                Decision::Allow
            } else {
                tracing::debug!(%route, role = ?viewer.role(), "Access denied");
                Decision::Denied {
                    fallback: Route::Dashboard,
                }
            }
        }
    }
}

/// Decide whether the current session may open `route`.
#[must_use]
pub fn guard(route: Route, session: &SessionStore) -> Decision {
    decide(route, Viewer::of(session))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;
    use sportgear_core::UserId;

    use super::*;
    use crate::models::SessionUser;
    use crate::session::{MemoryStorage, SessionStorage, USER_SLOT};

    fn signed_in(role: Role) -> SessionStore {
        let mut store = SessionStore::new(Arc::new(MemoryStorage::default()));
        store
            .login(
                SecretString::from("tok"),
                SessionUser::new(&UserId::from("u-1"), "a@b.co", role),
            )
            .unwrap();
        store
    }

    // =========================================================================
    // Router
    // =========================================================================

    #[test]
    fn test_customer_is_denied_admin_routes() {
        let store = signed_in(Role::Customer);
        for route in [Route::AdminDashboard, Route::UserManagement, Route::ProductManagement] {
            assert_eq!(
                guard(route, &store),
                Decision::Denied {
                    fallback: Route::Dashboard
                }
            );
        }
    }

    #[test]
    fn test_anonymous_is_redirected_from_private_routes() {
        let store = SessionStore::new(Arc::new(MemoryStorage::default()));
        assert_eq!(guard(Route::Orders, &store), Decision::RedirectToLogin);
        assert_eq!(guard(Route::AdminDashboard, &store), Decision::RedirectToLogin);
        assert_eq!(guard(Route::Catalog, &store), Decision::Allow);
        assert_eq!(guard(Route::Login, &store), Decision::Allow);
    }

    #[test]
    fn test_operator_reaches_logistics_but_not_catalog_admin() {
        let store = signed_in(Role::LogisticsOperator);
        assert_eq!(guard(Route::ShipmentManagement, &store), Decision::Allow);
        assert_eq!(guard(Route::OrderManagement, &store), Decision::Allow);
        assert!(matches!(guard(Route::ProductManagement, &store), Decision::Denied { .. }));
    }

    #[test]
    fn test_admins_reach_every_route() {
        for role in [Role::StoreAdmin, Role::SystemAdmin] {
            let store = signed_in(role);
            for route in Route::ALL {
                assert_eq!(guard(route, &store), Decision::Allow, "{role} on {route}");
            }
        }
    }

    #[test]
    fn test_unparsable_user_slot_falls_back_to_customer() {
        let storage = Arc::new(MemoryStorage::default());
        let mut store = SessionStore::new(storage.clone());
        store
            .login(
                SecretString::from("tok"),
                SessionUser::new(&UserId::from("u-1"), "a@b.co", Role::SystemAdmin),
            )
            .unwrap();
        storage.store(&[(USER_SLOT, "{not json")]).unwrap();

        assert_eq!(Viewer::of(&store), Viewer::Signed(Role::Customer));
        assert!(matches!(guard(Route::UserManagement, &store), Decision::Denied { .. }));
        assert_eq!(guard(Route::Orders, &store), Decision::Allow);
    }

    // =========================================================================
    // Actions
    // =========================================================================

    #[test]
    fn test_only_system_admin_assigns_roles() {
        assert!(can(Viewer::Signed(Role::SystemAdmin), Action::AssignRoles));
        assert!(!can(Viewer::Signed(Role::StoreAdmin), Action::AssignRoles));
        assert!(can(Viewer::Signed(Role::StoreAdmin), Action::ManageUsers));
    }

    #[test]
    fn test_anonymous_can_do_nothing() {
        assert!(!can(Viewer::Anonymous, Action::Checkout));
        assert!(can(Viewer::Signed(Role::Customer), Action::Checkout));
        assert!(can(Viewer::Signed(Role::FinanceManager), Action::CancelOrder));
        assert!(!can(Viewer::Signed(Role::FinanceManager), Action::AdvanceShipment));
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn test_route_from_str() {
        assert_eq!("/admin/users".parse::<Route>().unwrap(), Route::UserManagement);
        assert_eq!("admin/users/".parse::<Route>().unwrap(), Route::UserManagement);
        assert_eq!("/".parse::<Route>().unwrap(), Route::Home);
        assert!("/nowhere".parse::<Route>().is_err());
    }
}
