//! Payments resource.

use sportgear_core::PaymentId;
use tracing::instrument;

use super::{Cache, Entity};
use crate::error::{Operation, ResourceError};
use crate::gateway::{ApiClient, Backend};
use crate::models::{Payment, PaymentDraft};
use crate::sync::ViewScope;

const PAYMENTS_PATH: &str = "/api/v1/payments";

const LOAD: Operation = Operation::new("load", "payments");
const GET: Operation = Operation::new("load", "payment");
const CREATE: Operation = Operation::new("process", "payment");
const DELETE: Operation = Operation::new("delete", "payment");

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &PaymentId {
        &self.id
    }
}

/// Payments shown by one view.
#[derive(Clone)]
pub struct PaymentsResource {
    api: ApiClient,
    cache: Cache<Payment>,
}

impl PaymentsResource {
    #[must_use]
    pub fn new(api: ApiClient, scope: ViewScope) -> Self {
        Self {
            api,
            cache: Cache::new(scope),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Cache<Payment> {
        &self.cache
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_payments(&self) -> Result<Vec<Payment>, ResourceError> {
        let _busy = self.cache.begin();
        let result = self.api.get(Backend::Business, PAYMENTS_PATH, &[]).await;
        self.cache
            .settle(LOAD, result, |cache, payments: &Vec<Payment>| {
                cache.replace_all(payments.clone());
            })
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails.
    #[instrument(skip(self), fields(payment_id = %id))]
    pub async fn get_payment(&self, id: PaymentId) -> Result<Payment, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .get(Backend::Business, &format!("{PAYMENTS_PATH}/{id}"), &[])
            .await;
        self.cache.settle(GET, result, |_, _| {})
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the payment is refused.
    #[instrument(skip(self, draft), fields(order_id = %draft.order_id, method = %draft.method))]
    pub async fn create_payment(&self, draft: &PaymentDraft) -> Result<Payment, ResourceError> {
        let _busy = self.cache.begin();
        let result = self.api.post(Backend::Business, PAYMENTS_PATH, draft).await;
        self.cache
            .settle(CREATE, result, |cache, payment: &Payment| cache.append(payment.clone()))
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the payment stays cached.
    #[instrument(skip(self), fields(payment_id = %id))]
    pub async fn delete_payment(&self, id: PaymentId) -> Result<(), ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .delete(Backend::Business, &format!("{PAYMENTS_PATH}/{id}"))
            .await;
        self.cache.settle(DELETE, result, |cache, ()| cache.remove(&id))
    }
}
