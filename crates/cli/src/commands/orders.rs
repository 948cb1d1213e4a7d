//! Order history, order watching and cancellation.

use sportgear_core::{OrderId, UserId, format_money};
use sportgear_storefront::Storefront;
use sportgear_storefront::authz::Action;
use sportgear_storefront::models::Order;
use sportgear_storefront::sync::{
    CUSTOMER_ORDERS_POLL_INTERVAL, OPERATOR_POLL_INTERVAL, Poller, ViewScope,
};

use super::{AppError, require, signed_in};

/// Whose orders to show: `None` for every order.
fn owner(shop: &Storefront, mine: bool) -> Result<Option<UserId>, AppError> {
    let session = signed_in(shop)?;
    if !mine && shop.can(Action::ManageOrders) {
        return Ok(None);
    }
    Ok(session.user().id())
}

pub async fn list(shop: &Storefront, mine: bool) -> Result<(), AppError> {
    let owner = owner(shop, mine)?;
    let scope = ViewScope::new();
    let orders = shop.orders(&scope).fetch_orders(owner.as_ref()).await?;
    render(&orders);
    Ok(())
}

pub async fn watch(shop: &Storefront, mine: bool) -> Result<(), AppError> {
    let owner = owner(shop, mine)?;
    let interval = if owner.is_none() {
        OPERATOR_POLL_INTERVAL
    } else {
        CUSTOMER_ORDERS_POLL_INTERVAL
    };

    let scope = ViewScope::new();
    let orders = shop.orders(&scope);
    let _poll = Poller::start(interval, &scope, move || {
        let orders = orders.clone();
        let owner = owner.clone();
        async move {
            match orders.fetch_orders(owner.as_ref()).await {
                Ok(list) => render(&list),
                Err(e) => tracing::warn!("Refresh failed: {e}"),
            }
        }
    });

    tracing::info!("Watching orders every {}s, Ctrl-C to stop", interval.as_secs());
    tokio::signal::ctrl_c().await?;
    scope.unmount();
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn cancel(shop: &Storefront, id: OrderId) -> Result<(), AppError> {
    require(shop, Action::CancelOrder, "cancel orders")?;
    let scope = ViewScope::new();
    let orders = shop.orders(&scope);
    let current = orders.get_order(id).await?;
    if !current.status.is_cancellable() {
        println!("Order #{id} is {} and can no longer be cancelled", current.status);
        return Ok(());
    }
    let order = orders.cancel_order(id).await?;
    println!("Order #{} is now {}", order.id, order.status);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn render(orders: &[Order]) {
    println!();
    if orders.is_empty() {
        println!("No orders.");
        return;
    }
    for order in orders {
        let placed = order
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "#{:<6} {:<12} {:>14}  {placed}  {}",
            order.id,
            order.status,
            format_money(order.total),
            order.shipping_address.as_deref().unwrap_or("-"),
        );
    }
}
