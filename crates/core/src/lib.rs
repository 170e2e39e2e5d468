//! Domain model for itemhub.
//!
//! Holds the item entity, its request validation, and the [`ItemStore`]
//! port that persistence backends implement.

pub mod domain;
mod error;
pub mod store;

pub use domain::*;
pub use error::CoreError;
pub use store::{ItemStore, StoreError, StoreResult};
