//! SportGear Core - Shared types library.
//!
//! This crate provides common types used across all SportGear components:
//! - `storefront` - Client runtime (session, cart, resources, polling, authorization)
//! - `cli` - Terminal front-end over the storefront runtime
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients,
//! no persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, statuses and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
