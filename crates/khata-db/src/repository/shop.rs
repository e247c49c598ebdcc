//! Shop lookups.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use khata_core::Shop;

pub struct ShopRepository;

impl ShopRepository {
    pub async fn insert(conn: &mut SqliteConnection, shop: &Shop) -> DbResult<()> {
        debug!(id = %shop.id, name = %shop.name, "Inserting shop");

        sqlx::query("INSERT INTO shops (id, name, owner_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(&shop.id)
            .bind(&shop.name)
            .bind(&shop.owner_id)
            .bind(shop.created_at)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(shop)
    }

    /// Like [`ShopRepository::get`], but a missing shop is an error.
    pub async fn require(conn: &mut SqliteConnection, id: &str) -> DbResult<Shop> {
        Self::get(conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Shop", id))
    }
}
