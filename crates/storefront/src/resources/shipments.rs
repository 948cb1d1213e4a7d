//! Shipments resource.
//!
//! Operators create one shipment per order and move it along
//! `pending`/`dispatched` → `in_transit` → `delivered`.

use sportgear_core::{OrderId, ShipmentId, ShipmentStatus};
use tracing::instrument;

use super::{Cache, Entity};
use crate::error::{ApiError, Operation, ResourceError};
use crate::gateway::{ApiClient, Backend};
use crate::models::{Shipment, ShipmentDraft, ShipmentPatch, ShipmentStatusUpdate};
use crate::sync::ViewScope;

const SHIPMENTS_PATH: &str = "/api/v1/shipments";

const LOAD: Operation = Operation::new("load", "shipments");
const GET: Operation = Operation::new("load", "shipment");
const TRACK: Operation = Operation::new("find", "shipment");
const CREATE: Operation = Operation::new("create", "shipment");
const UPDATE: Operation = Operation::new("update", "shipment");
const UPDATE_STATUS: Operation = Operation::new("update the status of", "shipment");
const DELETE: Operation = Operation::new("delete", "shipment");

impl Entity for Shipment {
    type Id = ShipmentId;

    fn id(&self) -> &ShipmentId {
        &self.id
    }
}

/// Shipments shown by one view.
#[derive(Clone)]
pub struct ShipmentsResource {
    api: ApiClient,
    cache: Cache<Shipment>,
}

impl ShipmentsResource {
    #[must_use]
    pub fn new(api: ApiClient, scope: ViewScope) -> Self {
        Self {
            api,
            cache: Cache::new(scope),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Cache<Shipment> {
        &self.cache
    }

    #[must_use]
    pub fn shipments(&self) -> Vec<Shipment> {
        self.cache.items()
    }

    /// Load all shipments, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_shipments(&self, status: Option<ShipmentStatus>) -> Result<Vec<Shipment>, ResourceError> {
        let _busy = self.cache.begin();
        let query = [("status", status.map(|s| s.as_str().to_string()).unwrap_or_default())];
        let result = self.api.get(Backend::Shipment, SHIPMENTS_PATH, &query).await;
        self.cache
            .settle(LOAD, result, |cache, shipments: &Vec<Shipment>| {
                cache.replace_all(shipments.clone());
            })
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails.
    #[instrument(skip(self), fields(shipment_id = %id))]
    pub async fn get_shipment(&self, id: ShipmentId) -> Result<Shipment, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .get(Backend::Shipment, &format!("{SHIPMENTS_PATH}/{id}"), &[])
            .await;
        self.cache.settle(GET, result, |_, _| {})
    }

    /// The shipment of an order, or `None` if it has not shipped yet.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` for any failure other than a 404.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_shipment_by_order(&self, order_id: OrderId) -> Result<Option<Shipment>, ResourceError> {
        self.lookup(&format!("{SHIPMENTS_PATH}/order/{order_id}")).await
    }

    /// Look a shipment up by tracking number; `None` if there is no match.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` for any failure other than a 404.
    #[instrument(skip(self))]
    pub async fn get_shipment_by_tracking(&self, tracking_number: &str) -> Result<Option<Shipment>, ResourceError> {
        let path = format!(
            "{SHIPMENTS_PATH}/tracking/{}",
            urlencoding::encode(tracking_number.trim())
        );
        self.lookup(&path).await
    }

    async fn lookup(&self, path: &str) -> Result<Option<Shipment>, ResourceError> {
        let _busy = self.cache.begin();
        let result = match self.api.get::<Shipment>(Backend::Shipment, path, &[]).await {
            Ok(shipment) => Ok(Some(shipment)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        };
        self.cache.settle(TRACK, result, |_, _| {})
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails.
    #[instrument(skip(self, draft), fields(order_id = %draft.order_id))]
    pub async fn create_shipment(&self, draft: &ShipmentDraft) -> Result<Shipment, ResourceError> {
        let _busy = self.cache.begin();
        let result = self.api.post(Backend::Shipment, SHIPMENTS_PATH, draft).await;
        self.cache
            .settle(CREATE, result, |cache, shipment: &Shipment| cache.append(shipment.clone()))
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self, patch), fields(shipment_id = %id))]
    pub async fn update_shipment(&self, id: ShipmentId, patch: &ShipmentPatch) -> Result<Shipment, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .put(Backend::Shipment, &format!("{SHIPMENTS_PATH}/{id}"), patch)
            .await;
        self.cache
            .settle(UPDATE, result, |cache, shipment: &Shipment| cache.replace(shipment.clone()))
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self), fields(shipment_id = %id, status = %update.status))]
    pub async fn update_shipment_status(
        &self,
        id: ShipmentId,
        update: &ShipmentStatusUpdate,
    ) -> Result<Shipment, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .put(Backend::Shipment, &format!("{SHIPMENTS_PATH}/{id}/status"), update)
            .await;
        self.cache
            .settle(UPDATE_STATUS, result, |cache, shipment: &Shipment| {
                cache.replace(shipment.clone());
            })
    }

    /// Move a shipment one step along its progression.
    ///
    /// The current status is taken from the cache, or fetched when the
    /// shipment is not cached. Returns `Ok(None)` when the shipment is
    /// already delivered or cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if loading or updating the shipment fails.
    #[instrument(skip(self, vehicle_info), fields(shipment_id = %id))]
    pub async fn advance_shipment(
        &self,
        id: ShipmentId,
        vehicle_info: Option<String>,
    ) -> Result<Option<Shipment>, ResourceError> {
        let current = match self.cache.get(&id) {
            Some(shipment) => shipment,
            None => self.get_shipment(id).await?,
        };

        let Some(next) = current.status.next() else {
            tracing::debug!(status = %current.status, "Shipment has no next status");
            return Ok(None);
        };

        let vehicle_info = if next == ShipmentStatus::InTransit {
            vehicle_info.filter(|v| !v.trim().is_empty())
        } else {
            None
        };

        self.update_shipment_status(id, &ShipmentStatusUpdate { status: next, vehicle_info })
            .await
            .map(Some)
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the shipment stays cached.
    #[instrument(skip(self), fields(shipment_id = %id))]
    pub async fn delete_shipment(&self, id: ShipmentId) -> Result<(), ResourceError> {
        let _busy = self.cache.begin();
        let result: Result<(), ApiError> = self
            .api
            .delete(Backend::Shipment, &format!("{SHIPMENTS_PATH}/{id}"))
            .await;
        self.cache.settle(DELETE, result, |cache, ()| cache.remove(&id))
    }
}
