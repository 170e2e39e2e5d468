use thiserror::Error;

use crate::domain::{ItemId, ValidationErrors};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Validation failed for fields: {}", .0.keys().cloned().collect::<Vec<_>>().join(", "))]
    Validation(ValidationErrors),
}
