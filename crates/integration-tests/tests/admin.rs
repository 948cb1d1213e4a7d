//! Back-office operations: product, order, shipment, payment and account
//! maintenance against the mock backend.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use sportgear_core::{
    AccountStatus, Email, OrderId, OrderStatus, PaymentId, ProductId, ShipmentId, ShipmentStatus, UserId,
};
use sportgear_integration_tests::{MockBackend, PASSWORD};
use sportgear_storefront::Storefront;
use sportgear_storefront::models::{
    OrderPatch, PaymentDraft, PaymentMethod, ProductFilters, ProductPatch, ShipmentPatch, UserFilters,
};
use sportgear_storefront::sync::ViewScope;

async fn signed_in(mock: &MockBackend, email: &str) -> Storefront {
    let (mut shop, _) = mock.storefront();
    shop.login(&Email::parse(email).unwrap(), &SecretString::from(PASSWORD))
        .await
        .unwrap();
    shop
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_product_update_replaces_in_place() {
    let mock = MockBackend::start().await;
    let shop = signed_in(&mock, "admin@sportgear.co").await;
    let products = shop.products(&ViewScope::new());
    products.fetch_products(&ProductFilters::default()).await.unwrap();

    let patch = ProductPatch {
        price: Some(Decimal::new(39_900, 0)),
        ..ProductPatch::default()
    };
    let updated = products.update_product(ProductId::new(1), &patch).await.unwrap();
    assert_eq!(updated.product.price, Decimal::new(39_900, 0));

    let cached = products.products();
    assert_eq!(cached.len(), 3);
    assert_eq!(cached[0].product.id, ProductId::new(1));
    assert_eq!(cached[0].product.price, Decimal::new(39_900, 0));
}

#[tokio::test]
async fn test_product_delete_waits_for_server() {
    let mock = MockBackend::start().await;
    let shop = signed_in(&mock, "admin@sportgear.co").await;
    let products = shop.products(&ViewScope::new());
    products.fetch_products(&ProductFilters::default()).await.unwrap();

    mock.reply(
        Method::DELETE,
        "/api/v1/products/2",
        StatusCode::CONFLICT,
        json!({ "detail": "Product is referenced by open orders" }),
    );
    let err = products.delete_product(ProductId::new(2)).await.unwrap_err();
    assert_eq!(err.to_string(), "Product is referenced by open orders");
    assert_eq!(products.products().len(), 3);

    products.delete_product(ProductId::new(3)).await.unwrap();
    let left: Vec<_> = products.products().iter().map(|p| p.product.id).collect();
    assert_eq!(left, vec![ProductId::new(1), ProductId::new(2)]);
    assert_eq!(mock.db().products.len(), 2);
}

// ============================================================================
// Orders and shipments
// ============================================================================

#[tokio::test]
async fn test_order_update_replaces_in_place() {
    let mock = MockBackend::start().await;
    let shop = signed_in(&mock, "ops@sportgear.co").await;
    let orders = shop.orders(&ViewScope::new());
    orders.fetch_orders(None).await.unwrap();

    let patch = OrderPatch {
        status: Some(OrderStatus::Shipped),
        ..OrderPatch::default()
    };
    orders.update_order(OrderId::new(101), &patch).await.unwrap();

    let cached = orders.orders();
    assert_eq!(cached.len(), 4);
    assert_eq!(cached[1].id, OrderId::new(101));
    assert_eq!(cached[1].status, OrderStatus::Shipped);
    assert_eq!(cached[0].status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_shipment_update_and_delete() {
    let mock = MockBackend::start().await;
    let shop = signed_in(&mock, "ops@sportgear.co").await;
    let shipments = shop.shipments(&ViewScope::new());
    shipments.fetch_shipments(None).await.unwrap();

    let patch = ShipmentPatch {
        carrier: Some("Coordinadora".to_string()),
        ..ShipmentPatch::default()
    };
    let updated = shipments
        .update_shipment(ShipmentId::new(500), &patch)
        .await
        .unwrap();
    assert_eq!(updated.carrier.as_deref(), Some("Coordinadora"));
    assert_eq!(updated.status, ShipmentStatus::Dispatched);
    assert_eq!(
        shipments.shipments()[0].carrier.as_deref(),
        Some("Coordinadora")
    );

    shipments.delete_shipment(ShipmentId::new(500)).await.unwrap();
    assert!(shipments.shipments().is_empty());

    let err = shipments
        .get_shipment(ShipmentId::new(500))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Shipment not found.");
}

// ============================================================================
// Payments
// ============================================================================

#[tokio::test]
async fn test_payment_lifecycle() {
    let mock = MockBackend::start().await;
    let shop = signed_in(&mock, "admin@sportgear.co").await;
    let payments = shop.payments(&ViewScope::new());

    let draft = PaymentDraft {
        order_id: OrderId::new(100),
        amount: Decimal::new(50_000, 0),
        method: PaymentMethod::BankTransfer,
    };
    let created = payments.create_payment(&draft).await.unwrap();
    assert_eq!(created.id, PaymentId::new(1001));

    let listed = payments.fetch_payments().await.unwrap();
    assert_eq!(listed.len(), 1);
    let fetched = payments.get_payment(created.id).await.unwrap();
    assert_eq!(fetched.method, PaymentMethod::BankTransfer);
    assert_eq!(fetched.amount, Decimal::new(50_000, 0));

    payments.delete_payment(created.id).await.unwrap();
    assert!(payments.cache().is_empty());
    assert!(mock.db().payments.is_empty());
}

#[tokio::test]
async fn test_payment_for_unknown_order_is_refused() {
    let mock = MockBackend::start().await;
    let shop = signed_in(&mock, "admin@sportgear.co").await;
    let payments = shop.payments(&ViewScope::new());

    let draft = PaymentDraft {
        order_id: OrderId::new(9_999),
        amount: Decimal::new(1_000, 0),
        method: PaymentMethod::CreditCard,
    };
    let err = payments.create_payment(&draft).await.unwrap_err();
    assert_eq!(err.to_string(), "Unknown order");
    assert_eq!(payments.cache().error().as_deref(), Some("Unknown order"));
    assert!(payments.cache().is_empty());
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_status_change_patches_cached_user() {
    let mock = MockBackend::start().await;
    let shop = signed_in(&mock, "admin@sportgear.co").await;
    let users = shop.users(&ViewScope::new());
    users.fetch_users(&UserFilters::default()).await.unwrap();

    let ops = UserId::from("u-ops");
    users.update_status(&ops, AccountStatus::Suspended).await.unwrap();

    let cached = users.users();
    let record = cached.iter().find(|user| user.userid == ops).unwrap();
    assert_eq!(record.status, AccountStatus::Suspended);

    let fetched = users.get_user(&ops).await.unwrap();
    assert_eq!(fetched.status, AccountStatus::Suspended);
    assert_eq!(fetched.full_name(), "Oscar Pérez");
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let mock = MockBackend::start().await;
    let shop = signed_in(&mock, "admin@sportgear.co").await;
    let users = shop.users(&ViewScope::new());

    let err = users.get_user(&UserId::from("u-nobody")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "User not found.");
}

#[tokio::test]
async fn test_password_change_checks_current_password() {
    let mock = MockBackend::start().await;
    let shop = signed_in(&mock, "ana@sportgear.co").await;
    let users = shop.users(&ViewScope::new());
    let ana = UserId::from("u-ana");

    let err = users
        .update_password(&ana, &SecretString::from("wrong"), &SecretString::from("n3w"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Current password is incorrect");

    users
        .update_password(&ana, &SecretString::from(PASSWORD), &SecretString::from("n3w"))
        .await
        .unwrap();
    assert!(users.cache().error().is_none());
}
