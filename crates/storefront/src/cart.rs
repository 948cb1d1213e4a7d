//! Shopping cart.
//!
//! Line items are unique by product id and keep the order they were first
//! added in. Totals are always computed from the current lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sportgear_core::{Money, ProductId};

use crate::models::ProductDisplay;

/// Subtotal above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Money = Decimal::from_parts(50_000, 0, 0, false, 0);

/// Shipping fee charged at or below the threshold.
pub const FLAT_SHIPPING_FEE: Money = Decimal::from_parts(5_000, 0, 0, false, 0);

/// One product in the cart.
///
/// Name, price and image are snapshotted when the product is first added
/// and never re-fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub image: String,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * Decimal::from(self.quantity)
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Add one unit of `product`.
    pub fn add_to_cart(&mut self, product: &ProductDisplay) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == product.product.id) {
            item.quantity = item.quantity.saturating_add(1);
            return;
        }
        self.items.push(CartItem {
            id: product.product.id,
            name: product.product.name.clone(),
            price: product.product.price,
            quantity: 1,
            image: product.image.to_string(),
        });
    }

    /// Set a line's quantity, clamped to at least 1. Unknown ids are ignored.
    ///
    /// Use [`Cart::remove_item`] to drop a line.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.quantity = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        }
    }

    pub fn remove_item(&mut self, id: ProductId) {
        self.items.retain(|item| item.id != id);
    }

    /// Empty the cart. Only called after a confirmed checkout.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Free strictly above [`FREE_SHIPPING_THRESHOLD`], flat otherwise.
    #[must_use]
    pub fn shipping(&self) -> Money {
        shipping_fee(self.subtotal())
    }

    #[must_use]
    pub fn total(&self) -> Money {
        let subtotal = self.subtotal();
        subtotal + shipping_fee(subtotal)
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// Shipping fee for a given subtotal.
#[must_use]
pub fn shipping_fee(subtotal: Money) -> Money {
    if subtotal > FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_FEE
    }
}
