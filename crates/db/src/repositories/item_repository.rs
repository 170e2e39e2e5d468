use async_trait::async_trait;
use itemhub_core::{Item, ItemId, ItemStatus, ItemStore, NewItem, StoreResult};
use sqlx::SqlitePool;

use crate::error::DbError;
use crate::models::ItemRow;

#[derive(Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, item: &NewItem) -> Result<Item, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO items (name, description, status, email)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.status.as_str())
        .bind(&item.email)
        .execute(&self.pool)
        .await?;

        Ok(item.clone().into_item(ItemId(result.last_insert_rowid())))
    }

    pub async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, DbError> {
        let row: Option<ItemRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, status, email
            FROM items
            WHERE id = ?
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ItemRow::into_domain).transpose()
    }

    pub async fn find_all(&self) -> Result<Vec<Item>, DbError> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, status, email
            FROM items
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ItemRow::into_domain).collect()
    }

    pub async fn find_all_ids(&self) -> Result<Vec<ItemId>, DbError> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM items ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().map(ItemId).collect())
    }

    /// Inserts or fully replaces the row for `item.id`.
    pub async fn upsert(&self, item: &Item) -> Result<Item, DbError> {
        let row = ItemRow::from(item);

        sqlx::query(
            r#"
            INSERT INTO items (id, name, description, status, email)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                status = excluded.status,
                email = excluded.email
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.status)
        .bind(&row.email)
        .execute(&self.pool)
        .await?;

        Ok(item.clone())
    }

    pub async fn delete(&self, id: ItemId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of items per status. Statuses without items are reported as zero.
    pub async fn count_by_status(&self) -> Result<Vec<(ItemStatus, i64)>, DbError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM items GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let counts = ItemStatus::ALL
            .iter()
            .map(|status| {
                let count = rows
                    .iter()
                    .find(|(s, _)| s == status.as_str())
                    .map_or(0, |(_, c)| *c);
                (*status, count)
            })
            .collect();

        Ok(counts)
    }
}

#[async_trait]
impl ItemStore for ItemRepository {
    async fn list_ids(&self) -> StoreResult<Vec<ItemId>> {
        Ok(self.find_all_ids().await?)
    }

    async fn list(&self) -> StoreResult<Vec<Item>> {
        Ok(self.find_all().await?)
    }

    async fn find_by_id(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(ItemRepository::find_by_id(self, id).await?)
    }

    async fn insert(&self, item: NewItem) -> StoreResult<Item> {
        Ok(self.create(&item).await?)
    }

    async fn save(&self, item: &Item) -> StoreResult<Item> {
        Ok(self.upsert(item).await?)
    }

    async fn delete(&self, id: ItemId) -> StoreResult<bool> {
        Ok(ItemRepository::delete(self, id).await?)
    }
}
