//! Checkout from the command line.
//!
//! The cart lives only for the duration of the command: it is filled from
//! the `--item` arguments, then checked out.

use sportgear_core::{ProductId, format_money};
use sportgear_storefront::Storefront;
use sportgear_storefront::authz::Action;
use sportgear_storefront::checkout::CheckoutRequest;
use sportgear_storefront::models::{PaymentMethod, ProductDisplay};
use sportgear_storefront::sync::ViewScope;

use super::{AppError, require};

/// Parse `ID` or `ID:QUANTITY`.
fn parse_item(raw: &str) -> Result<(ProductId, i64), AppError> {
    let invalid = || AppError::InvalidItem(raw.to_string());
    let (id, quantity) = match raw.split_once(':') {
        Some((id, quantity)) => (id, quantity.trim().parse::<i64>().map_err(|_| invalid())?),
        None => (raw, 1),
    };
    let id = id.trim().parse::<ProductId>().map_err(|_| invalid())?;
    Ok((id, quantity))
}

/// Quantity for a line after `add_to_cart` put one more unit in it.
///
/// Repeating an id adds the quantities up, saturating at `i64::MAX`.
fn merged_quantity(in_cart: u32, requested: i64) -> i64 {
    i64::from(in_cart).saturating_sub(1).saturating_add(requested)
}

#[allow(clippy::print_stdout)]
pub async fn run(
    shop: &mut Storefront,
    items: &[String],
    address: String,
    method: PaymentMethod,
) -> Result<(), AppError> {
    require(shop, Action::Checkout, "place orders")?;
    let lines = items
        .iter()
        .map(|raw| parse_item(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let scope = ViewScope::new();
    let products = shop.products(&scope);
    for (id, quantity) in lines {
        let product = products.get_product(id).await?;
        if !product.in_stock {
            tracing::warn!("{} is sold out, ordering anyway", product.name);
        }
        let display = ProductDisplay::from_product(product, &mut rand::rng());
        let cart = shop.cart_mut();
        cart.add_to_cart(&display);
        let total = merged_quantity(cart.get(id).map_or(1, |line| line.quantity), quantity);
        cart.update_quantity(id, total);
    }

    let cart = shop.cart();
    for line in cart.items() {
        println!(
            "{:>3} x {:<40} {:>14}",
            line.quantity,
            line.name,
            format_money(line.line_total())
        );
    }
    println!("    subtotal {:>45}", format_money(cart.subtotal()));
    println!("    shipping {:>45}", format_money(cart.shipping()));
    println!("    total    {:>45}", format_money(cart.total()));

    let request = CheckoutRequest {
        shipping_address: address,
        method,
    };
    let receipt = shop.checkout(&scope, &request).await?;
    println!();
    println!(
        "Order #{} placed, payment #{} {}",
        receipt.order.id, receipt.payment.id, receipt.payment.status
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_defaults_to_one() {
        assert_eq!(parse_item("12").unwrap(), (ProductId::new(12), 1));
    }

    #[test]
    fn test_parse_item_with_quantity() {
        assert_eq!(parse_item("12:3").unwrap(), (ProductId::new(12), 3));
        assert_eq!(parse_item(" 7 : 2 ").unwrap(), (ProductId::new(7), 2));
    }

    #[test]
    fn test_parse_item_rejects_garbage() {
        assert!(matches!(parse_item("abc"), Err(AppError::InvalidItem(_))));
        assert!(matches!(parse_item("3:x"), Err(AppError::InvalidItem(_))));
    }

    #[test]
    fn test_repeated_item_adds_up() {
        // First mention: add_to_cart left one unit in the line.
        assert_eq!(merged_quantity(1, 2), 2);
        // Second mention of the same id with 2 already in the cart.
        assert_eq!(merged_quantity(3, 4), 6);
    }

    #[test]
    fn test_huge_repeated_quantity_saturates() {
        assert_eq!(merged_quantity(3, i64::MAX), i64::MAX);
        assert_eq!(merged_quantity(u32::MAX, i64::MAX), i64::MAX);
        assert_eq!(merged_quantity(1, i64::MIN), i64::MIN);
    }
}
