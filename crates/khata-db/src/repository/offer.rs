//! # Offer Repository
//!
//! Discount codes. Redemption rules live in `khata_core::order`; this
//! module only stores offers and counts uses.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use khata_core::Offer;

pub struct OfferRepository;

impl OfferRepository {
    pub async fn insert(conn: &mut SqliteConnection, offer: &Offer) -> DbResult<()> {
        debug!(id = %offer.id, shop_id = %offer.shop_id, code = %offer.code, "Inserting offer");

        sqlx::query(
            r#"
            INSERT INTO offers (
                id, shop_id, code, discount_kind, discount_value, max_discount_paise,
                min_order_paise, usage_limit, used_count, valid_from, valid_until, is_active
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&offer.id)
        .bind(&offer.shop_id)
        .bind(offer.code.to_uppercase())
        .bind(offer.discount_kind)
        .bind(offer.discount_value)
        .bind(offer.max_discount_paise)
        .bind(offer.min_order_paise)
        .bind(offer.usage_limit)
        .bind(offer.used_count)
        .bind(offer.valid_from)
        .bind(offer.valid_until)
        .bind(offer.is_active)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Offer>> {
        let offer = sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(offer)
    }

    /// Looks a code up within a shop. Codes are matched case-insensitively.
    pub async fn find_by_code(
        conn: &mut SqliteConnection,
        shop_id: &str,
        code: &str,
    ) -> DbResult<Option<Offer>> {
        let offer = sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE shop_id = ? AND code = ?")
            .bind(shop_id)
            .bind(code.trim().to_uppercase())
            .fetch_optional(&mut *conn)
            .await?;

        Ok(offer)
    }

    /// Counts one use, unless the usage limit has been reached.
    ///
    /// The limit is re-checked inside the UPDATE so two concurrent orders
    /// cannot both take the last use. Returns false if the offer was used up.
    pub async fn increment_usage(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE offers SET used_count = used_count + 1
             WHERE id = ? AND (usage_limit IS NULL OR used_count < usage_limit)
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
