//! # Offer Redemption
//!
//! The one primitive order creation needs from the offers subsystem:
//! validate a code against a cart and count one use, inside the caller's
//! transaction.
//!
//! ```text
//! find_by_code ──► offer_discount(window, limit, minimum) ──► increment_usage
//!      │                       │                                    │
//!   NotFound             OfferInvalid                 OfferInvalid (used up
//!                                                     by a concurrent order)
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use khata_core::order::offer_discount;
use khata_core::{CoreError, Money, Offer, OfferRejection};
use khata_db::OfferRepository;

use crate::error::LedgerResult;

/// Atomic validate-and-use of a discount code.
#[async_trait]
pub trait OfferRedeemer: Send + Sync {
    /// Returns the offer and the discount it grants on `subtotal`. The usage
    /// increment is written through `conn`, so it commits or rolls back with
    /// the order.
    async fn redeem(
        &self,
        conn: &mut SqliteConnection,
        shop_id: &str,
        code: &str,
        subtotal: Money,
        now: DateTime<Utc>,
    ) -> LedgerResult<(Offer, Money)>;
}

/// Redeems offers stored in the shop's `offers` table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteOfferRedeemer;

#[async_trait]
impl OfferRedeemer for SqliteOfferRedeemer {
    async fn redeem(
        &self,
        conn: &mut SqliteConnection,
        shop_id: &str,
        code: &str,
        subtotal: Money,
        now: DateTime<Utc>,
    ) -> LedgerResult<(Offer, Money)> {
        let offer = OfferRepository::find_by_code(conn, shop_id, code)
            .await?
            .ok_or_else(|| CoreError::not_found("Offer", code))?;

        let discount = offer_discount(&offer, subtotal, now).map_err(|reason| {
            CoreError::OfferInvalid {
                code: offer.code.clone(),
                reason,
            }
        })?;

        if !OfferRepository::increment_usage(conn, &offer.id).await? {
            return Err(CoreError::OfferInvalid {
                code: offer.code.clone(),
                reason: OfferRejection::UsageLimitReached,
            }
            .into());
        }

        debug!(shop_id, code = %offer.code, discount = %discount, "Offer redeemed");
        Ok((offer, discount))
    }
}
