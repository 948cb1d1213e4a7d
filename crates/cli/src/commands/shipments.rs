//! Shipment tracking and the logistics workflow.

use sportgear_core::{OrderId, ShipmentId, ShipmentStatus};
use sportgear_storefront::Storefront;
use sportgear_storefront::authz::Action;
use sportgear_storefront::models::{Shipment, ShipmentDraft};
use sportgear_storefront::sync::{OPERATOR_POLL_INTERVAL, Poller, ViewScope};

use super::{AppError, require};

pub async fn list(shop: &Storefront, status: Option<ShipmentStatus>) -> Result<(), AppError> {
    require(shop, Action::ManageShipments, "list shipments")?;
    let scope = ViewScope::new();
    let shipments = shop.shipments(&scope).fetch_shipments(status).await?;
    render(&shipments);
    Ok(())
}

/// Draft for `order_id`. Blank values are left for the backend to fill in.
fn draft(
    order_id: OrderId,
    tracking_number: Option<String>,
    carrier: Option<String>,
    vehicle: Option<String>,
) -> ShipmentDraft {
    let given = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    ShipmentDraft {
        tracking_number: given(tracking_number),
        carrier: given(carrier),
        vehicle_info: given(vehicle),
        ..ShipmentDraft::for_order(order_id)
    }
}

#[allow(clippy::print_stdout)]
pub async fn create(
    shop: &Storefront,
    order_id: OrderId,
    tracking_number: Option<String>,
    carrier: Option<String>,
    vehicle: Option<String>,
) -> Result<(), AppError> {
    require(shop, Action::ManageShipments, "create shipments")?;
    let draft = draft(order_id, tracking_number, carrier, vehicle);
    let shipment = shop.shipments(&ViewScope::new()).create_shipment(&draft).await?;
    println!(
        "Shipment #{} created for order #{} ({})",
        shipment.id, shipment.order_id, shipment.status
    );
    if let Some(tracking_number) = &shipment.tracking_number {
        println!("  tracking number: {tracking_number}");
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn track(shop: &Storefront, tracking_number: &str) -> Result<(), AppError> {
    let scope = ViewScope::new();
    match shop
        .shipments(&scope)
        .get_shipment_by_tracking(tracking_number)
        .await?
    {
        Some(shipment) => render_one(&shipment),
        None => println!("No shipment with tracking number {tracking_number}."),
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn advance(shop: &Storefront, id: ShipmentId, vehicle: Option<String>) -> Result<(), AppError> {
    require(shop, Action::AdvanceShipment, "update shipments")?;
    let scope = ViewScope::new();
    match shop.shipments(&scope).advance_shipment(id, vehicle).await? {
        Some(shipment) => println!("Shipment #{} is now {}", shipment.id, shipment.status),
        None => println!("Shipment #{id} is already at its final status."),
    }
    Ok(())
}

pub async fn watch(shop: &Storefront, status: Option<ShipmentStatus>) -> Result<(), AppError> {
    require(shop, Action::ManageShipments, "list shipments")?;
    let scope = ViewScope::new();
    let shipments = shop.shipments(&scope);
    let _poll = Poller::start(OPERATOR_POLL_INTERVAL, &scope, move || {
        let shipments = shipments.clone();
        async move {
            match shipments.fetch_shipments(status).await {
                Ok(list) => render(&list),
                Err(e) => tracing::warn!("Refresh failed: {e}"),
            }
        }
    });

    tracing::info!(
        "Watching shipments every {}s, Ctrl-C to stop",
        OPERATOR_POLL_INTERVAL.as_secs()
    );
    tokio::signal::ctrl_c().await?;
    scope.unmount();
    Ok(())
}

#[allow(clippy::print_stdout)]
fn render(shipments: &[Shipment]) {
    println!();
    if shipments.is_empty() {
        println!("No shipments.");
        return;
    }
    for shipment in shipments {
        println!(
            "#{:<6} order #{:<6} {:<11} {:<20} {}",
            shipment.id,
            shipment.order_id,
            shipment.status,
            shipment.tracking_number.as_deref().unwrap_or("-"),
            shipment.carrier.as_deref().unwrap_or("-"),
        );
    }
}

#[allow(clippy::print_stdout)]
fn render_one(shipment: &Shipment) {
    let date = |at: Option<sportgear_storefront::models::Timestamp>| {
        at.map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string())
    };
    println!("Shipment #{} for order #{}", shipment.id, shipment.order_id);
    println!("  status:    {}", shipment.status);
    println!("  carrier:   {}", shipment.carrier.as_deref().unwrap_or("-"));
    if let Some(vehicle) = &shipment.vehicle_info {
        println!("  vehicle:   {vehicle}");
    }
    println!("  shipped:   {}", date(shipment.shipped_at));
    println!("  estimated: {}", date(shipment.estimated_delivery));
    println!("  delivered: {}", date(shipment.delivered_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_drops_blank_fields() {
        let draft = draft(
            OrderId::new(101),
            Some(" SG-0042 ".to_string()),
            Some("   ".to_string()),
            None,
        );
        assert_eq!(draft.order_id, OrderId::new(101));
        assert_eq!(draft.tracking_number.as_deref(), Some("SG-0042"));
        assert!(draft.carrier.is_none());
        assert!(draft.vehicle_info.is_none());
        assert!(draft.status.is_none());
    }
}
