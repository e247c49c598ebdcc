//! # Product Repository
//!
//! Catalog reads and the guarded stock updates used by order settlement.
//!
//! ## Stock Guard
//! ```text
//! UPDATE products SET stock = stock - :qty
//!  WHERE id = :id AND stock >= :qty
//!
//! rows_affected = 1  → deducted
//! rows_affected = 0  → someone else got there first (InsufficientStock)
//! ```
//! The `stock >= qty` predicate is evaluated by SQLite under the write
//! lock, so two concurrent orders can never both take the last unit.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use super::push_id_list;
use crate::error::DbResult;
use khata_core::Product;

pub struct ProductRepository;

impl ProductRepository {
    pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, shop_id = %product.shop_id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, shop_id, name, price_paise, cost_paise,
                stock, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.shop_id)
        .bind(&product.name)
        .bind(product.price_paise)
        .bind(product.cost_paise)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(product)
    }

    /// Fetches every listed product that belongs to the shop, in one query.
    /// Ids from other shops are simply absent from the result.
    pub async fn find_many(
        conn: &mut SqliteConnection,
        shop_id: &str,
        ids: &[String],
    ) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM products WHERE shop_id = ");
        qb.push_bind(shop_id.to_string());
        qb.push(" AND id IN ");
        push_id_list(&mut qb, ids);

        let products = qb.build_query_as::<Product>().fetch_all(&mut *conn).await?;
        Ok(products)
    }

    /// Deducts stock if enough is left. Returns false (and changes nothing)
    /// when the product has fewer than `quantity` units.
    pub async fn decrement_stock(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, quantity, "Decrementing stock");

        let result = sqlx::query(
            "UPDATE products SET stock = stock - ?, updated_at = ? WHERE id = ? AND stock >= ?",
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Puts units back, e.g. when an order's items are replaced.
    pub async fn restore_stock(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(id = %id, quantity, "Restoring stock");

        sqlx::query("UPDATE products SET stock = stock + ?, updated_at = ? WHERE id = ?")
            .bind(quantity)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
