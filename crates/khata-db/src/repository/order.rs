//! # Order Repository
//!
//! Orders and their lines. Lines are snapshots: name, price and cost are
//! copied at order time so later catalog edits don't rewrite history.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use khata_core::{Order, OrderLine, OrderStatus};

pub struct OrderRepository;

impl OrderRepository {
    /// Inserts the order and all of its lines.
    pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(
            id = %order.id,
            shop_id = %order.shop_id,
            total = order.total_paise,
            lines = order.items.len(),
            "Inserting order"
        );

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, shop_id, customer_id, status,
                subtotal_paise, discount_paise, delivery_charge_paise, total_paise,
                offer_id, payment_preference, fulfillment_method,
                price_verified, verified_by, verified_at, estimated_ready_at,
                sale_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.id)
        .bind(&order.shop_id)
        .bind(&order.customer_id)
        .bind(order.status)
        .bind(order.subtotal_paise)
        .bind(order.discount_paise)
        .bind(order.delivery_charge_paise)
        .bind(order.total_paise)
        .bind(&order.offer_id)
        .bind(order.payment_preference)
        .bind(order.fulfillment_method)
        .bind(order.price_verified)
        .bind(&order.verified_by)
        .bind(order.verified_at)
        .bind(order.estimated_ready_at)
        .bind(&order.sale_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        Self::insert_lines(conn, &order.items).await
    }

    async fn insert_lines(conn: &mut SqliteConnection, lines: &[OrderLine]) -> DbResult<()> {
        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, position, product_id, name, quantity,
                    unit_price_paise, unit_cost_paise, line_total_paise
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&line.id)
            .bind(&line.order_id)
            .bind(line.position)
            .bind(&line.product_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price_paise)
            .bind(line.unit_cost_paise)
            .bind(line.line_total_paise)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Gets an order with its lines.
    pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(mut order) = order else {
            return Ok(None);
        };
        order.items = Self::get_lines(conn, id).await?;
        Ok(Some(order))
    }

    pub async fn get_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT * FROM order_items WHERE order_id = ? ORDER BY position",
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }

    /// Replaces every line of an order and writes the new totals.
    /// Verification is reset: new lines need new eyes.
    pub async fn replace_lines(
        conn: &mut SqliteConnection,
        order: &Order,
    ) -> DbResult<()> {
        debug!(id = %order.id, lines = order.items.len(), "Replacing order lines");

        sqlx::query("DELETE FROM order_items WHERE order_id = ?")
            .bind(&order.id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            UPDATE orders
               SET subtotal_paise = ?, discount_paise = ?, total_paise = ?, status = ?,
                   price_verified = ?, verified_by = ?, verified_at = ?, updated_at = ?
             WHERE id = ?
            "#,
        )
        .bind(order.subtotal_paise)
        .bind(order.discount_paise)
        .bind(order.total_paise)
        .bind(order.status)
        .bind(order.price_verified)
        .bind(&order.verified_by)
        .bind(order.verified_at)
        .bind(order.updated_at)
        .bind(&order.id)
        .execute(&mut *conn)
        .await?;

        Self::insert_lines(conn, &order.items).await
    }

    /// Moves an order to `to`, but only if it is still in `from`.
    /// Returns false when another writer changed the status first.
    pub async fn update_status(
        conn: &mut SqliteConnection,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, from = %from, to = %to, "Updating order status");

        let result =
            sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
                .bind(to)
                .bind(now)
                .bind(id)
                .bind(from)
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn set_price_verified(
        conn: &mut SqliteConnection,
        id: &str,
        verifier_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE orders
               SET price_verified = 1, verified_by = ?, verified_at = ?, updated_at = ?
             WHERE id = ?
            "#,
        )
        .bind(verifier_id)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Links the ledger sale recorded on collection.
    pub async fn set_sale(conn: &mut SqliteConnection, id: &str, sale_id: &str) -> DbResult<()> {
        sqlx::query("UPDATE orders SET sale_id = ? WHERE id = ?")
            .bind(sale_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
