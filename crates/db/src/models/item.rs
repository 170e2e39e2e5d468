use itemhub_core::{Item, ItemId, ItemStatus};

use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status: String,
    pub email: String,
}

impl ItemRow {
    pub fn into_domain(self) -> Result<Item, DbError> {
        let id = ItemId(self.id);
        let status = ItemStatus::parse(&self.status).ok_or_else(|| DbError::InvalidStatus {
            id,
            status: self.status.clone(),
        })?;

        Ok(Item {
            id,
            name: self.name,
            description: self.description,
            status,
            email: self.email,
        })
    }
}

impl From<&Item> for ItemRow {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.get(),
            name: item.name.clone(),
            description: item.description.clone(),
            status: item.status.as_str().to_string(),
            email: item.email.clone(),
        }
    }
}
