//! # Credit Entry Repository
//!
//! The open-credit index. Rows here answer "which bills are still open",
//! never "how much is owed".

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use super::push_id_list;
use crate::error::DbResult;
use khata_core::{CreditEntry, CreditStatus};

pub struct CreditRepository;

impl CreditRepository {
    pub async fn insert(conn: &mut SqliteConnection, entry: &CreditEntry) -> DbResult<()> {
        debug!(
            id = %entry.id,
            sale_id = %entry.sale_id,
            amount = entry.amount_paise,
            "Inserting credit entry"
        );

        sqlx::query(
            r#"
            INSERT INTO credit_entries (
                id, shop_id, customer_id, sale_id, amount_paise, status, created_at, closed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.shop_id)
        .bind(&entry.customer_id)
        .bind(&entry.sale_id)
        .bind(entry.amount_paise)
        .bind(entry.status)
        .bind(entry.created_at)
        .bind(entry.closed_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// The live entry of a sale, if any.
    pub async fn get_by_sale(
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Option<CreditEntry>> {
        let entry =
            sqlx::query_as::<_, CreditEntry>("SELECT * FROM credit_entries WHERE sale_id = ?")
                .bind(sale_id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(entry)
    }

    /// Entries for any of the listed sales.
    pub async fn get_by_sales(
        conn: &mut SqliteConnection,
        sale_ids: &[String],
    ) -> DbResult<Vec<CreditEntry>> {
        if sale_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM credit_entries WHERE sale_id IN ");
        push_id_list(&mut qb, sale_ids);

        Ok(qb.build_query_as::<CreditEntry>().fetch_all(&mut *conn).await?)
    }

    /// OPEN entries of a customer in a shop, oldest first.
    pub async fn list_open(
        conn: &mut SqliteConnection,
        shop_id: &str,
        customer_id: &str,
    ) -> DbResult<Vec<CreditEntry>> {
        let entries = sqlx::query_as::<_, CreditEntry>(
            r#"
            SELECT * FROM credit_entries
             WHERE shop_id = ? AND customer_id = ? AND status = ?
             ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(shop_id)
        .bind(customer_id)
        .bind(CreditStatus::Open)
        .fetch_all(&mut *conn)
        .await?;

        Ok(entries)
    }

    /// Marks the listed OPEN entries PAID and returns them as updated.
    pub async fn mark_paid(
        conn: &mut SqliteConnection,
        ids: &[String],
        closed_at: DateTime<Utc>,
    ) -> DbResult<Vec<CreditEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = ids.len(), "Closing credit entries");

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE credit_entries SET status = ");
        qb.push_bind(CreditStatus::Paid)
            .push(", closed_at = ")
            .push_bind(closed_at)
            .push(" WHERE status = ")
            .push_bind(CreditStatus::Open)
            .push(" AND id IN ");
        push_id_list(&mut qb, ids);
        qb.push(" RETURNING *");

        Ok(qb.build_query_as::<CreditEntry>().fetch_all(&mut *conn).await?)
    }

    /// Resizes an OPEN entry. Returns false if the entry is missing or PAID.
    pub async fn update_amount(
        conn: &mut SqliteConnection,
        id: &str,
        amount_paise: i64,
    ) -> DbResult<bool> {
        let result =
            sqlx::query("UPDATE credit_entries SET amount_paise = ? WHERE id = ? AND status = ?")
                .bind(amount_paise)
                .bind(id)
                .bind(CreditStatus::Open)
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM credit_entries WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes the entries of the listed sales, whatever their status.
    pub async fn delete_by_sales(
        conn: &mut SqliteConnection,
        sale_ids: &[String],
    ) -> DbResult<u64> {
        if sale_ids.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM credit_entries WHERE sale_id IN ");
        push_id_list(&mut qb, sale_ids);

        Ok(qb.build().execute(&mut *conn).await?.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
