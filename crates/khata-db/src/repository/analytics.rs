//! # Daily Analytics Repository
//!
//! Per-shop, per-day counters. Written by the analytics worker only, never
//! inside a ledger transaction.

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::error::DbResult;
use khata_core::{AnalyticsDelta, DailyAnalytics};

pub struct AnalyticsRepository;

impl AnalyticsRepository {
    /// Adds the delta to the day's row, creating it on first use.
    pub async fn apply(conn: &mut SqliteConnection, delta: &AnalyticsDelta) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO daily_analytics (shop_id, day, views, orders, revenue_paise, profit_paise)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (shop_id, day) DO UPDATE SET
                views         = views + excluded.views,
                orders        = orders + excluded.orders,
                revenue_paise = revenue_paise + excluded.revenue_paise,
                profit_paise  = profit_paise + excluded.profit_paise
            "#,
        )
        .bind(&delta.shop_id)
        .bind(delta.day)
        .bind(delta.views)
        .bind(delta.orders)
        .bind(delta.revenue_paise)
        .bind(delta.profit_paise)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get(
        conn: &mut SqliteConnection,
        shop_id: &str,
        day: NaiveDate,
    ) -> DbResult<Option<DailyAnalytics>> {
        let row = sqlx::query_as::<_, DailyAnalytics>(
            "SELECT * FROM daily_analytics WHERE shop_id = ? AND day = ?",
        )
        .bind(shop_id)
        .bind(day)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }
}
