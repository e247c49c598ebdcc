//! Read-side queries. All balances come from the sale log.

use tracing::debug;

use khata_core::validation::validate_id;
use khata_core::{
    CreditEntry, CustomerBalance, DateRange, Money, SalesCursor, SalesFilter, SalesPage,
    SalesSummary, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use khata_db::{CreditRepository, SaleRepository};

use super::{balance_in, require_customer, require_shop, LedgerService};
use crate::error::LedgerResult;

impl LedgerService {
    /// Σ credit − Σ (cash + upi) for the customer in this shop.
    pub async fn get_balance(&self, shop_id: &str, customer_id: &str) -> LedgerResult<Money> {
        validate_id("shop_id", shop_id)?;
        validate_id("customer_id", customer_id)?;

        let mut conn = self.db.acquire().await?;
        require_shop(&mut conn, shop_id).await?;
        require_customer(&mut conn, customer_id).await?;
        balance_in(&mut conn, shop_id, customer_id).await
    }

    /// One newest-first page of sales. `limit` defaults to
    /// [`DEFAULT_PAGE_SIZE`] and is capped at [`MAX_PAGE_SIZE`].
    pub async fn get_all_sales(
        &self,
        shop_id: &str,
        filter: &SalesFilter,
        cursor: Option<&SalesCursor>,
        limit: Option<u32>,
    ) -> LedgerResult<SalesPage> {
        validate_id("shop_id", shop_id)?;
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        debug!(shop_id, limit, has_cursor = cursor.is_some(), "Listing sales");

        let mut conn = self.db.acquire().await?;
        let mut sales = SaleRepository::list(&mut conn, shop_id, filter, cursor, limit).await?;

        let next_cursor = if sales.len() > limit as usize {
            sales.truncate(limit as usize);
            sales.last().map(|last| SalesCursor {
                created_at: last.created_at,
                id: last.id.clone(),
            })
        } else {
            None
        };

        Ok(SalesPage { sales, next_cursor })
    }

    pub async fn get_sales_summary(
        &self,
        shop_id: &str,
        range: &DateRange,
    ) -> LedgerResult<SalesSummary> {
        validate_id("shop_id", shop_id)?;
        let mut conn = self.db.acquire().await?;
        Ok(SaleRepository::summary(&mut conn, shop_id, range).await?)
    }

    /// Customers with a nonzero balance, largest first.
    pub async fn get_outstanding_balances(
        &self,
        shop_id: &str,
    ) -> LedgerResult<Vec<CustomerBalance>> {
        validate_id("shop_id", shop_id)?;
        let mut conn = self.db.acquire().await?;
        Ok(SaleRepository::outstanding_balances(&mut conn, shop_id).await?)
    }

    /// OPEN credit entries, oldest first. Display only; may be stale
    /// relative to the balance.
    pub async fn get_open_credit_entries(
        &self,
        shop_id: &str,
        customer_id: &str,
    ) -> LedgerResult<Vec<CreditEntry>> {
        validate_id("shop_id", shop_id)?;
        validate_id("customer_id", customer_id)?;
        let mut conn = self.db.acquire().await?;
        Ok(CreditRepository::list_open(&mut conn, shop_id, customer_id).await?)
    }
}
