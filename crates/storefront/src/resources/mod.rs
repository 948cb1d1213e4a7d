//! Resources: one per backend collection, each owning a view's cache.
//!
//! Every resource follows the same rules:
//!
//! - `fetch_*` replaces the cache wholesale with the server's list
//! - `create_*` appends the entity the server returned, never the draft
//! - `update_*` replaces the matching entity in place; a rejection leaves
//!   the cache untouched
//! - `delete_*` removes the entity only once the server confirmed
//!
//! Failures are recorded in the cache's `error` and returned as a
//! [`ResourceError`](crate::error::ResourceError). Nothing is retried.
//! Instances are independent: two views editing the same order do not
//! coordinate, and the last write wins at the server.

mod auth;
mod cache;
mod orders;
mod payments;
mod products;
mod shipments;
mod users;

pub use auth::AuthApi;
pub use cache::{Cache, Entity};
pub use orders::OrdersResource;
pub use payments::PaymentsResource;
pub use products::ProductsResource;
pub use shipments::ShipmentsResource;
pub use users::UsersResource;
