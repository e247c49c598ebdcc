//! Sale and payment recording.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use khata_core::ledger::{allocate_payment, check_credit_limit};
use khata_core::validation::{validate_amount, validate_id, validate_new_sale, validate_notes};
use khata_core::{
    CreditEntry, CreditStatus, Money, NewPayment, NewSale, PaymentKind, PaymentReceipt, Sale,
    SaleOrigin,
};
use khata_db::{CreditRepository, SaleRepository};

use super::{balance_in, require_customer, require_shop, LedgerService};
use crate::error::LedgerResult;

impl LedgerService {
    /// Records a sale, or a credit ("udhaar") bill when `kind` is CREDIT.
    ///
    /// ## Credit Limit
    /// ```text
    /// kind = CREDIT, customer has a limit, no bypass:
    ///   projected = balance + amount
    ///   projected > limit  →  CreditLimitExceeded, nothing written
    /// ```
    /// A CREDIT sale with a customer also opens a credit entry in the same
    /// transaction.
    pub async fn record_sale(&self, new_sale: NewSale) -> LedgerResult<Sale> {
        debug!(
            shop_id = %new_sale.shop_id,
            amount = new_sale.amount_paise,
            kind = %new_sale.kind,
            origin = ?new_sale.origin,
            "Recording sale"
        );
        validate_new_sale(&new_sale)?;

        let mut tx = self.db.begin().await?;
        let sale = write_sale(&mut tx, &new_sale, Utc::now()).await?;
        tx.commit().await?;

        if sale.origin == SaleOrigin::Manual {
            self.analytics
                .record_order(&sale.shop_id, sale.created_at, sale.amount(), Money::zero());
        }

        info!(sale_id = %sale.id, shop_id = %sale.shop_id, amount = %sale.amount(), "Sale recorded");
        Ok(sale)
    }

    /// Records money received from a customer and closes the credit
    /// entries it covers.
    ///
    /// Entries are walked oldest first; each one the remaining payment
    /// fully covers is marked PAID, and the walk stops at the first entry
    /// that is larger than what is left. Part-payments leave entries OPEN
    /// but always count towards the balance.
    pub async fn record_payment(&self, payment: NewPayment) -> LedgerResult<PaymentReceipt> {
        debug!(
            shop_id = %payment.shop_id,
            customer_id = %payment.customer_id,
            amount = payment.amount_paise,
            "Recording payment"
        );
        validate_id("shop_id", &payment.shop_id)?;
        validate_id("customer_id", &payment.customer_id)?;
        validate_amount(payment.amount_paise)?;
        validate_notes(payment.notes.as_deref())?;

        let amount = Money::from_paise(payment.amount_paise);
        let now = Utc::now();

        let mut tx = self.db.begin().await?;
        require_shop(&mut tx, &payment.shop_id).await?;
        require_customer(&mut tx, &payment.customer_id).await?;

        let prior_balance = balance_in(&mut tx, &payment.shop_id, &payment.customer_id).await?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            shop_id: payment.shop_id.clone(),
            customer_id: Some(payment.customer_id.clone()),
            amount_paise: amount.paise(),
            kind: PaymentKind::from(payment.method),
            origin: SaleOrigin::Payment,
            notes: payment.notes.clone(),
            tags: Vec::new(),
            created_at: now,
            edited_by: None,
            edited_at: None,
            edit_reason: None,
        };
        SaleRepository::insert(&mut tx, &sale).await?;

        let open = CreditRepository::list_open(&mut tx, &payment.shop_id, &payment.customer_id).await?;
        let to_close = allocate_payment(&open, amount);
        let updated_credit_entries = CreditRepository::mark_paid(&mut tx, &to_close, now).await?;

        tx.commit().await?;

        let new_balance = prior_balance - amount;
        info!(
            sale_id = %sale.id,
            customer_id = %payment.customer_id,
            closed = updated_credit_entries.len(),
            balance = %new_balance,
            "Payment recorded"
        );

        Ok(PaymentReceipt {
            sale,
            updated_credit_entries,
            new_balance_paise: new_balance.paise(),
        })
    }
}

/// Inserts a validated sale and, for CREDIT with a customer, its OPEN
/// entry. Runs the credit-limit check unless the request bypasses it.
pub(crate) async fn write_sale(
    conn: &mut SqliteConnection,
    new_sale: &NewSale,
    now: DateTime<Utc>,
) -> LedgerResult<Sale> {
    require_shop(conn, &new_sale.shop_id).await?;

    let amount = Money::from_paise(new_sale.amount_paise);
    if let Some(customer_id) = &new_sale.customer_id {
        let customer = require_customer(conn, customer_id).await?;
        if new_sale.kind.is_credit() && !new_sale.bypass_credit_limit {
            let balance = balance_in(conn, &new_sale.shop_id, customer_id).await?;
            check_credit_limit(balance, customer.credit_limit(), amount)?;
        }
    }

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        shop_id: new_sale.shop_id.clone(),
        customer_id: new_sale.customer_id.clone(),
        amount_paise: amount.paise(),
        kind: new_sale.kind,
        origin: new_sale.origin,
        notes: new_sale.notes.clone(),
        tags: Vec::new(),
        created_at: now,
        edited_by: None,
        edited_at: None,
        edit_reason: None,
    };
    SaleRepository::insert(conn, &sale).await?;

    if let (true, Some(customer_id)) = (sale.kind.is_credit(), &sale.customer_id) {
        let entry = CreditEntry {
            id: Uuid::new_v4().to_string(),
            shop_id: sale.shop_id.clone(),
            customer_id: customer_id.clone(),
            sale_id: sale.id.clone(),
            amount_paise: sale.amount_paise,
            status: CreditStatus::Open,
            created_at: now,
            closed_at: None,
        };
        CreditRepository::insert(conn, &entry).await?;
    }

    Ok(sale)
}
