//! Checkout: turn the cart into an order and its payment.

use thiserror::Error;
use tracing::instrument;

use crate::cart::Cart;
use crate::error::{ResourceError, add_breadcrumb};
use crate::models::{Order, OrderDraft, Payment, PaymentDraft, PaymentMethod};
use crate::resources::{OrdersResource, PaymentsResource};
use crate::session::Session;

/// Why a checkout did not complete. The cart is untouched in every case.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty.")]
    EmptyCart,

    #[error("Please enter a shipping address.")]
    MissingAddress,

    #[error("Please sign in to place an order.")]
    NotAuthenticated,

    /// The signed-in user record carries no id to place the order under.
    #[error("Your account is missing a user id. Please sign in again.")]
    MissingUserId,

    #[error("{0}")]
    Order(#[source] ResourceError),

    /// The order exists but paying for it failed.
    #[error("{source}")]
    Payment {
        order: Box<Order>,
        #[source]
        source: ResourceError,
    },
}

/// What the shopper submits on the checkout form.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub shipping_address: String,
    pub method: PaymentMethod,
}

/// A completed checkout.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub order: Order,
    pub payment: Payment,
}

/// Place an order for everything in `cart` and pay for it.
///
/// The order and the payment carry the cart subtotal; shipping is shown to
/// the shopper but not charged through the backend. The cart is cleared
/// only after both the order and the payment are confirmed.
///
/// # Errors
///
/// Returns `CheckoutError` if validation fails or either request is
/// rejected. No request is sent when validation fails.
#[instrument(skip_all, fields(items = cart.items().len(), method = %request.method))]
pub async fn checkout(
    orders: &OrdersResource,
    payments: &PaymentsResource,
    session: Option<&Session>,
    cart: &mut Cart,
    request: &CheckoutRequest,
) -> Result<Receipt, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let address = request.shipping_address.trim();
    if address.is_empty() {
        return Err(CheckoutError::MissingAddress);
    }
    let session = session.ok_or(CheckoutError::NotAuthenticated)?;
    let user_id = session
        .user()
        .id()
        .filter(|id| !id.is_blank())
        .ok_or(CheckoutError::MissingUserId)?;

    let total = cart.subtotal();
    let order = orders
        .create_order(&OrderDraft {
            user_id,
            total,
            shipping_address: Some(address.to_string()),
        })
        .await
        .map_err(CheckoutError::Order)?;

    let payment = match payments
        .create_payment(&PaymentDraft {
            order_id: order.id,
            amount: total,
            method: request.method,
        })
        .await
    {
        Ok(payment) => payment,
        Err(source) => {
            tracing::warn!(order_id = %order.id, error = %source, "Payment failed after order was created");
            return Err(CheckoutError::Payment {
                order: Box::new(order),
                source,
            });
        }
    };

    cart.clear();
    add_breadcrumb("checkout", "Order placed", None);
    tracing::info!(order_id = %order.id, total = %total, "Checkout complete");

    Ok(Receipt { order, payment })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use sportgear_core::{ProductId, Role, UserId};
    use url::Url;

    use super::*;
    use crate::gateway::{ApiClient, Endpoints};
    use crate::models::{Product, ProductDisplay, SessionUser};
    use crate::session::{MemoryStorage, SessionStore};
    use crate::sync::ViewScope;

    // Nothing listens on port 9; any request that slips through fails.
    fn resources() -> (OrdersResource, PaymentsResource) {
        let base = Url::parse("http://127.0.0.1:9").unwrap();
        let api = ApiClient::new(Endpoints::uniform(&base), Duration::from_secs(1)).unwrap();
        let scope = ViewScope::new();
        (
            OrdersResource::new(api.clone(), scope.clone()),
            PaymentsResource::new(api, scope),
        )
    }

    fn cart_with_one_item() -> Cart {
        let mut cart = Cart::new();
        cart.add_to_cart(&ProductDisplay {
            product: Product {
                id: ProductId::new(1),
                name: "Ball".to_string(),
                description: None,
                price: Decimal::new(10_000, 0),
                category: "Football".to_string(),
                brand: None,
                sport: None,
                gender: None,
                in_stock: true,
                stock_quantity: 3,
                created_at: None,
                updated_at: None,
            },
            image: "img",
            rating: 5,
            in_stock_flag: true,
        });
        cart
    }

    fn request(address: &str) -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: address.to_string(),
            method: PaymentMethod::CreditCard,
        }
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let (orders, payments) = resources();
        let mut cart = Cart::new();
        let err = checkout(&orders, &payments, None, &mut cart, &request("1 Main St"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_blank_address_is_rejected() {
        let (orders, payments) = resources();
        let mut cart = cart_with_one_item();
        let err = checkout(&orders, &payments, None, &mut cart, &request("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::MissingAddress));
        assert_eq!(cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_requires_session() {
        let (orders, payments) = resources();
        let mut cart = cart_with_one_item();
        let err = checkout(&orders, &payments, None, &mut cart, &request("1 Main St"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_failed_order_keeps_cart() {
        let (orders, payments) = resources();
        let mut store = SessionStore::new(std::sync::Arc::new(MemoryStorage::default()));
        let user = SessionUser::new(&UserId::from("u-1"), "a@b.co", Role::Customer);
        store.login(SecretString::from("tok"), user).unwrap();

        let mut cart = cart_with_one_item();
        let err = checkout(&orders, &payments, store.current(), &mut cart, &request("1 Main St"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Order(_)));
        assert_eq!(err.to_string(), crate::error::CONNECTION_ERROR);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(orders.cache().error().as_deref(), Some(crate::error::CONNECTION_ERROR));
    }
}
