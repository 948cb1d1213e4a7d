//! Orders resource.

use sportgear_core::{OrderId, OrderStatus, UserId};
use tracing::instrument;

use super::{Cache, Entity};
use crate::error::{Operation, ResourceError};
use crate::gateway::{ApiClient, Backend};
use crate::models::{Order, OrderDraft, OrderPatch};
use crate::sync::{ViewScope, optimistic_update};

const ORDERS_PATH: &str = "/api/v1/orders";

const LOAD: Operation = Operation::new("load", "orders");
const GET: Operation = Operation::new("load", "order");
const CREATE: Operation = Operation::new("create", "order");
const UPDATE: Operation = Operation::new("update", "order");
const DELETE: Operation = Operation::new("delete", "order");
const CANCEL: Operation = Operation::new("cancel", "order");

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &OrderId {
        &self.id
    }
}

/// Orders shown by one view.
#[derive(Clone)]
pub struct OrdersResource {
    api: ApiClient,
    cache: Cache<Order>,
}

impl OrdersResource {
    #[must_use]
    pub fn new(api: ApiClient, scope: ViewScope) -> Self {
        Self {
            api,
            cache: Cache::new(scope),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Cache<Order> {
        &self.cache
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.cache.items()
    }

    /// Load all orders, or only `user_id`'s.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_orders(&self, user_id: Option<&UserId>) -> Result<Vec<Order>, ResourceError> {
        let _busy = self.cache.begin();
        let query = [("user_id", user_id.map(ToString::to_string).unwrap_or_default())];
        let result = self.api.get(Backend::Business, ORDERS_PATH, &query).await;
        self.cache
            .settle(LOAD, result, |cache, orders: &Vec<Order>| cache.replace_all(orders.clone()))
    }

    /// Load one order. The cache is not touched.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .get(Backend::Business, &format!("{ORDERS_PATH}/{id}"), &[])
            .await;
        self.cache.settle(GET, result, |_, _| {})
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails.
    #[instrument(skip(self, draft), fields(user_id = %draft.user_id))]
    pub async fn create_order(&self, draft: &OrderDraft) -> Result<Order, ResourceError> {
        let _busy = self.cache.begin();
        let result = self.api.post(Backend::Business, ORDERS_PATH, draft).await;
        self.cache
            .settle(CREATE, result, |cache, order: &Order| cache.append(order.clone()))
    }

    /// Update an order.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self, patch), fields(order_id = %id))]
    pub async fn update_order(&self, id: OrderId, patch: &OrderPatch) -> Result<Order, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .put(Backend::Business, &format!("{ORDERS_PATH}/{id}"), patch)
            .await;
        self.cache
            .settle(UPDATE, result, |cache, order: &Order| cache.replace(order.clone()))
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the order stays cached.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .delete(Backend::Business, &format!("{ORDERS_PATH}/{id}"))
            .await;
        self.cache.settle(DELETE, result, |cache, ()| cache.remove(&id))
    }

    /// Cancel an order optimistically.
    ///
    /// The cached order shows `cancelled` at once; if the server refuses,
    /// its previous status comes back and the reason is recorded.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the server refuses the cancellation.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, ResourceError> {
        let path = format!("{ORDERS_PATH}/{id}/cancel");
        optimistic_update(
            &self.cache,
            &id,
            CANCEL,
            |order| order.status = OrderStatus::Cancelled,
            self.api.post_empty(Backend::Business, &path),
        )
        .await
    }
}
