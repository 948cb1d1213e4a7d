//! Catalog resource, including the admin product management operations.

use sportgear_core::ProductId;
use tracing::instrument;

use super::{Cache, Entity};
use crate::error::{Operation, ResourceError};
use crate::gateway::{ApiClient, Backend};
use crate::models::{Product, ProductDisplay, ProductDraft, ProductFilters, ProductPatch};
use crate::sync::ViewScope;

const PRODUCTS_PATH: &str = "/api/v1/products";
const SEARCH_PATH: &str = "/api/v1/products/search";

const LOAD: Operation = Operation::new("load", "products");
const GET: Operation = Operation::new("load", "product");
const CREATE: Operation = Operation::new("create", "product");
const UPDATE: Operation = Operation::new("update", "product");
const DELETE: Operation = Operation::new("delete", "product");

impl Entity for ProductDisplay {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.product.id
    }
}

/// Products shown by one view, already projected for display.
#[derive(Clone)]
pub struct ProductsResource {
    api: ApiClient,
    cache: Cache<ProductDisplay>,
}

impl ProductsResource {
    #[must_use]
    pub fn new(api: ApiClient, scope: ViewScope) -> Self {
        Self {
            api,
            cache: Cache::new(scope),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Cache<ProductDisplay> {
        &self.cache
    }

    #[must_use]
    pub fn products(&self) -> Vec<ProductDisplay> {
        self.cache.items()
    }

    /// Load the catalog. Any non-empty filter goes through the search
    /// endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self, filters: &ProductFilters) -> Result<Vec<ProductDisplay>, ResourceError> {
        let _busy = self.cache.begin();
        let result = if filters.is_empty() {
            self.api.get::<Vec<Product>>(Backend::Business, PRODUCTS_PATH, &[]).await
        } else {
            self.api
                .get::<Vec<Product>>(Backend::Business, SEARCH_PATH, &filters.to_query())
                .await
        };
        let result = result.map(|products| {
            let mut rng = rand::rng();
            products
                .into_iter()
                .map(|product| ProductDisplay::from_product(product, &mut rng))
                .collect::<Vec<_>>()
        });
        self.cache
            .settle(LOAD, result, |cache, products: &Vec<ProductDisplay>| {
                cache.replace_all(products.clone());
            })
    }

    /// Load one product as stored by the catalog. The cache is not touched.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .get(Backend::Business, &format!("{PRODUCTS_PATH}/{id}"), &[])
            .await;
        self.cache.settle(GET, result, |_, _| {})
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<ProductDisplay, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .post::<_, Product>(Backend::Business, PRODUCTS_PATH, draft)
            .await
            .map(|product| ProductDisplay::from_product(product, &mut rand::rng()));
        self.cache
            .settle(CREATE, result, |cache, product: &ProductDisplay| {
                cache.append(product.clone());
            })
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update_product(&self, id: ProductId, patch: &ProductPatch) -> Result<ProductDisplay, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .put::<_, Product>(Backend::Business, &format!("{PRODUCTS_PATH}/{id}"), patch)
            .await
            .map(|product| ProductDisplay::from_product(product, &mut rand::rng()));
        self.cache
            .settle(UPDATE, result, |cache, product: &ProductDisplay| {
                cache.replace(product.clone());
            })
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the product stays cached.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .delete(Backend::Business, &format!("{PRODUCTS_PATH}/{id}"))
            .await;
        self.cache.settle(DELETE, result, |cache, ()| cache.remove(&id))
    }
}
