//! Keeping views in step with server-owned state.
//!
//! The backends have no push channel, so views that show mutable server
//! state poll it. A [`ViewScope`] models the lifetime of one view: resources
//! bound to it stop applying responses once it unmounts, and a [`Poller`]
//! bound to it stops ticking.

mod optimistic;
mod poller;

pub use optimistic::optimistic_update;
pub use poller::{PollHandle, Poller};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Refresh interval of the operator order and shipment views.
pub const OPERATOR_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Refresh interval of the customer's order history.
pub const CUSTOMER_ORDERS_POLL_INTERVAL: Duration = Duration::from_secs(15);
/// Refresh interval of the admin product view.
pub const ADMIN_PRODUCTS_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Lifetime of one view.
///
/// Clones share the same lifetime. Unmounting is permanent.
#[derive(Debug, Clone)]
pub struct ViewScope {
    unmounted: Arc<watch::Sender<bool>>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    /// A freshly mounted view.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            unmounted: Arc::new(tx),
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !*self.unmounted.borrow()
    }

    /// Tear the view down. Responses arriving afterwards are dropped.
    pub fn unmount(&self) {
        if !self.unmounted.send_replace(true) {
            tracing::debug!("View unmounted");
        }
    }

    /// Resolves once the view has unmounted.
    pub async fn unmounted(&self) {
        let mut rx = self.unmounted.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|unmounted| *unmounted).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_unmount_is_shared_and_permanent() {
        let scope = ViewScope::new();
        let clone = scope.clone();
        assert!(clone.is_mounted());

        scope.unmount();
        assert!(!clone.is_mounted());
        scope.unmount();
        assert!(!scope.is_mounted());
    }

    #[tokio::test]
    async fn test_unmounted_resolves() {
        let scope = ViewScope::new();
        let waiter = {
            let scope = scope.clone();
            tokio::spawn(async move { scope.unmounted().await })
        };
        scope.unmount();
        assert!(waiter.await.is_ok());

        // Already unmounted: resolves immediately.
        scope.unmounted().await;
    }
}
