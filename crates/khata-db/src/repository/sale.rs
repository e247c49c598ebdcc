//! # Sale Repository
//!
//! The ledger log. Every balance in the system is an aggregate over this
//! table; nothing caches it.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. INSERT                                                             │
//! │     └── recordSale / recordPayment / order collection                  │
//! │                                                                         │
//! │  2. (OPTIONAL) UPDATE                                                  │
//! │     └── amount / kind / notes / tags + edit metadata                   │
//! │                                                                         │
//! │  3. (OPTIONAL) DELETE                                                  │
//! │     └── hard delete, credit entries removed first                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use super::push_id_list;
use crate::error::DbResult;
use khata_core::ledger::LedgerTotals;
use khata_core::{
    CustomerBalance, DateRange, Money, Sale, SalesCursor, SalesFilter, SalesSummary,
};

pub struct SaleRepository;

impl SaleRepository {
    pub async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(
            id = %sale.id,
            shop_id = %sale.shop_id,
            amount = sale.amount_paise,
            kind = %sale.kind,
            "Inserting sale"
        );

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, shop_id, customer_id, amount_paise, kind, origin,
                notes, tags, created_at, edited_by, edited_at, edit_reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.shop_id)
        .bind(&sale.customer_id)
        .bind(sale.amount_paise)
        .bind(sale.kind)
        .bind(sale.origin)
        .bind(&sale.notes)
        .bind(Json(&sale.tags))
        .bind(sale.created_at)
        .bind(&sale.edited_by)
        .bind(sale.edited_at)
        .bind(&sale.edit_reason)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a sale by id, only if it belongs to the shop.
    pub async fn get(
        conn: &mut SqliteConnection,
        shop_id: &str,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ? AND shop_id = ?")
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(sale)
    }

    /// Gets every listed sale that belongs to the shop.
    pub async fn get_many(
        conn: &mut SqliteConnection,
        shop_id: &str,
        ids: &[String],
    ) -> DbResult<Vec<Sale>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM sales WHERE shop_id = ");
        qb.push_bind(shop_id.to_string());
        qb.push(" AND id IN ");
        push_id_list(&mut qb, ids);

        Ok(qb.build_query_as::<Sale>().fetch_all(&mut *conn).await?)
    }

    /// Writes the mutable fields of a sale: amount, kind, notes, tags and
    /// the edit metadata.
    pub async fn update(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, amount = sale.amount_paise, kind = %sale.kind, "Updating sale");

        sqlx::query(
            r#"
            UPDATE sales
               SET amount_paise = ?, kind = ?, notes = ?, tags = ?,
                   edited_by = ?, edited_at = ?, edit_reason = ?
             WHERE id = ? AND shop_id = ?
            "#,
        )
        .bind(sale.amount_paise)
        .bind(sale.kind)
        .bind(&sale.notes)
        .bind(Json(&sale.tags))
        .bind(&sale.edited_by)
        .bind(sale.edited_at)
        .bind(&sale.edit_reason)
        .bind(&sale.id)
        .bind(&sale.shop_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Hard-deletes the listed sales of a shop. Credit entries must already
    /// be gone.
    pub async fn delete_many(
        conn: &mut SqliteConnection,
        shop_id: &str,
        ids: &[String],
    ) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM sales WHERE shop_id = ");
        qb.push_bind(shop_id.to_string());
        qb.push(" AND id IN ");
        push_id_list(&mut qb, ids);

        let result = qb.build().execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Credit given and payments received for one customer in one shop.
    pub async fn totals(
        conn: &mut SqliteConnection,
        shop_id: &str,
        customer_id: &str,
    ) -> DbResult<LedgerTotals> {
        let (credit, received): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'CREDIT' THEN amount_paise ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind IN ('CASH', 'UPI') THEN amount_paise ELSE 0 END), 0)
            FROM sales
            WHERE shop_id = ? AND customer_id = ?
            "#,
        )
        .bind(shop_id)
        .bind(customer_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(LedgerTotals {
            credit: Money::from_paise(credit),
            received: Money::from_paise(received),
        })
    }

    /// Every customer of the shop whose balance is not zero, largest first.
    pub async fn outstanding_balances(
        conn: &mut SqliteConnection,
        shop_id: &str,
    ) -> DbResult<Vec<CustomerBalance>> {
        let balances = sqlx::query_as::<_, CustomerBalance>(
            r#"
            SELECT customer_id,
                   SUM(CASE WHEN kind = 'CREDIT' THEN amount_paise ELSE -amount_paise END)
                       AS balance_paise
              FROM sales
             WHERE shop_id = ? AND customer_id IS NOT NULL
             GROUP BY customer_id
            HAVING balance_paise != 0
             ORDER BY balance_paise DESC, customer_id
            "#,
        )
        .bind(shop_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(balances)
    }

    /// Counts and totals per kind over a creation-time window.
    pub async fn summary(
        conn: &mut SqliteConnection,
        shop_id: &str,
        range: &DateRange,
    ) -> DbResult<SalesSummary> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN kind = 'CASH' THEN amount_paise ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'UPI' THEN amount_paise ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'CREDIT' THEN amount_paise ELSE 0 END), 0)
            FROM sales
            WHERE shop_id = "#,
        );
        qb.push_bind(shop_id.to_string());
        push_range(&mut qb, range);

        let (sale_count, cash_paise, upi_paise, credit_paise): (i64, i64, i64, i64) =
            qb.build_query_as().fetch_one(&mut *conn).await?;

        let received_paise = cash_paise + upi_paise;
        Ok(SalesSummary {
            sale_count,
            cash_paise,
            upi_paise,
            credit_paise,
            received_paise,
            net_credit_paise: credit_paise - received_paise,
        })
    }

    /// One page of sales, newest first.
    ///
    /// Keyset pagination on `(created_at, id)`: the page starts strictly
    /// after `cursor`. Fetches `limit + 1` rows so the caller can tell
    /// whether another page exists.
    pub async fn list(
        conn: &mut SqliteConnection,
        shop_id: &str,
        filter: &SalesFilter,
        cursor: Option<&SalesCursor>,
        limit: u32,
    ) -> DbResult<Vec<Sale>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM sales WHERE shop_id = ");
        qb.push_bind(shop_id.to_string());

        if let Some(customer_id) = &filter.customer_id {
            qb.push(" AND customer_id = ").push_bind(customer_id.clone());
        }
        if let Some(kind) = filter.kind {
            qb.push(" AND kind = ").push_bind(kind);
        }
        if let Some(origin) = filter.origin {
            qb.push(" AND origin = ").push_bind(origin);
        }
        push_range(&mut qb, &filter.range);

        if let Some(cursor) = cursor {
            qb.push(" AND (created_at < ")
                .push_bind(cursor.created_at)
                .push(" OR (created_at = ")
                .push_bind(cursor.created_at)
                .push(" AND id < ")
                .push_bind(cursor.id.clone())
                .push("))");
        }

        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(limit) + 1);

        Ok(qb.build_query_as::<Sale>().fetch_all(&mut *conn).await?)
    }
}

/// `from <= created_at < to`, each bound optional.
fn push_range(qb: &mut QueryBuilder<'_, Sqlite>, range: &DateRange) {
    let bounds: [(&str, Option<DateTime<Utc>>); 2] =
        [(" AND created_at >= ", range.from), (" AND created_at < ", range.to)];
    for (clause, bound) in bounds {
        if let Some(at) = bound {
            qb.push(clause).push_bind(at);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::{Database, DbConfig};
    use khata_core::{PaymentKind, SaleOrigin};

    #[tokio::test]
    async fn test_insert_and_get_roundtrips_tags() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let shop = testing::shop(&mut conn, "Shop").await;
        let customer = testing::customer(&mut conn, "Ravi", None).await;

        let mut sale = testing::sale(&shop.id, Some(&customer.id), 50_000, PaymentKind::Credit);
        sale.tags = vec!["festival".to_string()];
        SaleRepository::insert(&mut conn, &sale).await.unwrap();

        let fetched = SaleRepository::get(&mut conn, &shop.id, &sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.tags, vec!["festival".to_string()]);
        assert_eq!(fetched.kind, PaymentKind::Credit);
        assert_eq!(fetched.origin, SaleOrigin::Manual);

        // Not visible from another shop.
        let other = testing::shop(&mut conn, "Other").await;
        assert!(SaleRepository::get(&mut conn, &other.id, &sale.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_totals_and_outstanding() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let shop = testing::shop(&mut conn, "Shop").await;
        let ravi = testing::customer(&mut conn, "Ravi", None).await;
        let meena = testing::customer(&mut conn, "Meena", None).await;

        for (customer, amount, kind) in [
            (&ravi, 50_000, PaymentKind::Credit),
            (&ravi, 20_000, PaymentKind::Cash),
            (&meena, 10_000, PaymentKind::Credit),
            (&meena, 10_000, PaymentKind::Upi),
        ] {
            let sale = testing::sale(&shop.id, Some(&customer.id), amount, kind);
            SaleRepository::insert(&mut conn, &sale).await.unwrap();
        }
        // Walk-in cash sale: no customer, never in a balance.
        let walk_in = testing::sale(&shop.id, None, 9_900, PaymentKind::Cash);
        SaleRepository::insert(&mut conn, &walk_in).await.unwrap();

        let totals = SaleRepository::totals(&mut conn, &shop.id, &ravi.id).await.unwrap();
        assert_eq!(totals.balance().paise(), 30_000);

        let outstanding = SaleRepository::outstanding_balances(&mut conn, &shop.id)
            .await
            .unwrap();
        assert_eq!(
            outstanding,
            vec![CustomerBalance {
                customer_id: ravi.id.clone(),
                balance_paise: 30_000
            }]
        );

        let summary = SaleRepository::summary(&mut conn, &shop.id, &DateRange::default())
            .await
            .unwrap();
        assert_eq!(summary.sale_count, 5);
        assert_eq!(summary.cash_paise, 29_900);
        assert_eq!(summary.upi_paise, 10_000);
        assert_eq!(summary.credit_paise, 60_000);
        assert_eq!(summary.net_credit_paise, 60_000 - 39_900);
    }

    #[tokio::test]
    async fn test_list_keyset_pages() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let shop = testing::shop(&mut conn, "Shop").await;

        let base = Utc::now();
        for i in 0..5 {
            let mut sale = testing::sale(&shop.id, None, 100 + i, PaymentKind::Cash);
            sale.created_at = base + chrono::Duration::seconds(i);
            SaleRepository::insert(&mut conn, &sale).await.unwrap();
        }

        let filter = SalesFilter::default();
        let first = SaleRepository::list(&mut conn, &shop.id, &filter, None, 2)
            .await
            .unwrap();
        // limit + 1 rows come back
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].amount_paise, 104);
        assert_eq!(first[1].amount_paise, 103);

        let cursor = SalesCursor {
            created_at: first[1].created_at,
            id: first[1].id.clone(),
        };
        let second = SaleRepository::list(&mut conn, &shop.id, &filter, Some(&cursor), 2)
            .await
            .unwrap();
        let amounts: Vec<i64> = second.iter().map(|s| s.amount_paise).collect();
        assert_eq!(amounts, vec![102, 101, 100]);
    }
}
