//! # Ledger Math
//!
//! Pure rules behind the balance, credit-limit, payment and edit flows.
//! The database layer aggregates; this module decides.
//!
//! ## Balance Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale log (authoritative)          CreditEntry index (best-effort)     │
//! │  ┌──────────────────────┐          ┌──────────────────────────┐        │
//! │  │ +500  CREDIT         │◄────────►│ 500  OPEN                │        │
//! │  │ -200  CASH           │          │                          │        │
//! │  │ -300  UPI            │          │ (still OPEN: partial     │        │
//! │  └──────────────────────┘          │  payments never close)   │        │
//! │            │                       └──────────────────────────┘        │
//! │            ▼                                                            │
//! │  balance = Σ credit − Σ (cash + upi) = 0                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CreditEntry, PaymentKind, Sale};

// =============================================================================
// Balance
// =============================================================================

/// Credit given and payments received for one customer in one shop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub credit: Money,
    pub received: Money,
}

impl LedgerTotals {
    /// Folds raw sales into totals.
    pub fn from_sales<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Self {
        sales
            .into_iter()
            .fold(LedgerTotals::default(), |mut totals, sale| {
                totals.add(sale.kind, sale.amount());
                totals
            })
    }

    pub fn add(&mut self, kind: PaymentKind, amount: Money) {
        match kind {
            PaymentKind::Credit => self.credit += amount,
            PaymentKind::Cash | PaymentKind::Upi => self.received += amount,
        }
    }

    /// What the customer owes. Negative means the shop holds an advance.
    #[inline]
    pub fn balance(&self) -> Money {
        self.credit - self.received
    }
}

// =============================================================================
// Credit Limit
// =============================================================================

/// Checks a new CREDIT amount against the customer's limit.
///
/// `None` means the customer has no limit. The check uses a strict `>`:
/// landing exactly on the limit is allowed.
pub fn check_credit_limit(
    current_balance: Money,
    limit: Option<Money>,
    amount: Money,
) -> CoreResult<()> {
    let Some(limit) = limit else {
        return Ok(());
    };

    let projected = current_balance + amount;
    if projected > limit {
        return Err(CoreError::CreditLimitExceeded {
            current_balance,
            limit,
            projected,
            overage: projected - limit,
        });
    }
    Ok(())
}

// =============================================================================
// Payment Allocation
// =============================================================================

/// Picks which OPEN entries a payment closes.
///
/// `open_entries` must be ordered oldest first. Each entry fully covered by
/// what is left of the payment is closed; the walk stops at the first entry
/// larger than the remainder, even if a later, smaller entry would fit.
pub fn allocate_payment(open_entries: &[CreditEntry], amount: Money) -> Vec<String> {
    let mut remaining = amount;
    let mut closed = Vec::new();

    for entry in open_entries {
        if entry.is_paid() {
            continue;
        }
        if entry.amount() > remaining {
            break;
        }
        remaining -= entry.amount();
        closed.push(entry.id.clone());
    }

    closed
}

// =============================================================================
// Edit Planning
// =============================================================================

/// What an edit does to the sale's credit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditAction {
    /// Leave the index alone.
    None,
    /// CREDIT → CASH/UPI: the bill no longer exists.
    Delete { entry_id: String },
    /// CASH/UPI → CREDIT (or a CREDIT sale whose entry went missing).
    Create { customer_id: String, amount: Money },
    /// CREDIT → CREDIT with a new amount.
    UpdateAmount { entry_id: String, amount: Money },
}

/// Decides the credit-index action for an edit of `sale` to
/// `new_kind`/`new_amount`, given its current entry.
///
/// A PAID entry is settled history: any edit that would delete or resize it
/// is a Conflict.
pub fn plan_credit_edit(
    sale: &Sale,
    entry: Option<&CreditEntry>,
    new_kind: PaymentKind,
    new_amount: Money,
) -> CoreResult<CreditAction> {
    let amount_changed = new_amount != sale.amount();

    match (sale.kind.is_credit(), new_kind.is_credit()) {
        (true, false) => match entry {
            Some(entry) if entry.is_paid() => Err(CoreError::conflict(format!(
                "sale {} has a settled credit entry and cannot change to {}",
                sale.id, new_kind
            ))),
            Some(entry) => Ok(CreditAction::Delete {
                entry_id: entry.id.clone(),
            }),
            None => Ok(CreditAction::None),
        },

        (false, true) => {
            let customer_id = sale.customer_id.clone().ok_or_else(|| {
                CoreError::Validation(ValidationError::Required {
                    field: "customer_id".to_string(),
                })
            })?;
            match entry {
                Some(entry) if entry.is_paid() => Err(CoreError::conflict(format!(
                    "sale {} already has a settled credit entry",
                    sale.id
                ))),
                Some(entry) => Ok(CreditAction::UpdateAmount {
                    entry_id: entry.id.clone(),
                    amount: new_amount,
                }),
                None => Ok(CreditAction::Create {
                    customer_id,
                    amount: new_amount,
                }),
            }
        }

        (true, true) if amount_changed => match entry {
            Some(entry) if entry.is_paid() => Err(CoreError::conflict(format!(
                "sale {} has a settled credit entry; its amount cannot change",
                sale.id
            ))),
            Some(entry) => Ok(CreditAction::UpdateAmount {
                entry_id: entry.id.clone(),
                amount: new_amount,
            }),
            None => Ok(match &sale.customer_id {
                Some(customer_id) => CreditAction::Create {
                    customer_id: customer_id.clone(),
                    amount: new_amount,
                },
                None => CreditAction::None,
            }),
        },

        _ => Ok(CreditAction::None),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CreditStatus, SaleOrigin};
    use chrono::Utc;

    fn sale(kind: PaymentKind, paise: i64, customer: Option<&str>) -> Sale {
        Sale {
            id: "sale-1".to_string(),
            shop_id: "shop-1".to_string(),
            customer_id: customer.map(str::to_string),
            amount_paise: paise,
            kind,
            origin: SaleOrigin::Manual,
            notes: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            edited_by: None,
            edited_at: None,
            edit_reason: None,
        }
    }

    fn entry(id: &str, paise: i64, status: CreditStatus) -> CreditEntry {
        CreditEntry {
            id: id.to_string(),
            shop_id: "shop-1".to_string(),
            customer_id: "cust-1".to_string(),
            sale_id: format!("sale-of-{id}"),
            amount_paise: paise,
            status,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn test_balance_fold() {
        let sales = vec![
            sale(PaymentKind::Credit, 50_000, Some("c")),
            sale(PaymentKind::Cash, 20_000, Some("c")),
            sale(PaymentKind::Upi, 30_000, Some("c")),
        ];
        let totals = LedgerTotals::from_sales(&sales);
        assert_eq!(totals.credit.paise(), 50_000);
        assert_eq!(totals.received.paise(), 50_000);
        assert!(totals.balance().is_zero());
    }

    #[test]
    fn test_overpayment_goes_negative() {
        let sales = vec![
            sale(PaymentKind::Credit, 1_000, Some("c")),
            sale(PaymentKind::Cash, 1_500, Some("c")),
        ];
        assert_eq!(LedgerTotals::from_sales(&sales).balance().paise(), -500);
    }

    #[test]
    fn test_credit_limit() {
        let limit = Some(Money::from_rupees(1000));

        assert!(check_credit_limit(Money::from_rupees(800), None, Money::from_rupees(5000)).is_ok());
        assert!(check_credit_limit(Money::from_rupees(800), limit, Money::from_rupees(200)).is_ok());

        match check_credit_limit(Money::from_rupees(800), limit, Money::from_rupees(300)) {
            Err(CoreError::CreditLimitExceeded {
                current_balance,
                projected,
                overage,
                ..
            }) => {
                assert_eq!(current_balance, Money::from_rupees(800));
                assert_eq!(projected, Money::from_rupees(1100));
                assert_eq!(overage, Money::from_rupees(100));
            }
            other => panic!("expected CreditLimitExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_limit_blocks_any_credit() {
        let result = check_credit_limit(Money::zero(), Some(Money::zero()), Money::from_paise(1));
        assert!(matches!(result, Err(CoreError::CreditLimitExceeded { .. })));
    }

    #[test]
    fn test_allocate_stops_at_first_uncovered_entry() {
        let entries = vec![
            entry("e1", 10_000, CreditStatus::Open),
            entry("e2", 30_000, CreditStatus::Open),
            entry("e3", 5_000, CreditStatus::Open),
        ];

        // 150: e1 fits, e2 doesn't; e3 would fit but the walk has stopped.
        let closed = allocate_payment(&entries, Money::from_paise(15_000));
        assert_eq!(closed, vec!["e1".to_string()]);

        let closed = allocate_payment(&entries, Money::from_paise(45_000));
        assert_eq!(closed, vec!["e1", "e2", "e3"]);

        assert!(allocate_payment(&entries, Money::from_paise(5_000)).is_empty());
    }

    #[test]
    fn test_plan_credit_to_cash() {
        let credit = sale(PaymentKind::Credit, 500, Some("c"));

        let open = entry("e1", 500, CreditStatus::Open);
        assert_eq!(
            plan_credit_edit(&credit, Some(&open), PaymentKind::Cash, credit.amount()).unwrap(),
            CreditAction::Delete {
                entry_id: "e1".to_string()
            }
        );

        let paid = entry("e1", 500, CreditStatus::Paid);
        assert!(matches!(
            plan_credit_edit(&credit, Some(&paid), PaymentKind::Upi, credit.amount()),
            Err(CoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_plan_cash_to_credit() {
        let cash = sale(PaymentKind::Cash, 700, Some("c"));
        assert_eq!(
            plan_credit_edit(&cash, None, PaymentKind::Credit, Money::from_paise(900)).unwrap(),
            CreditAction::Create {
                customer_id: "c".to_string(),
                amount: Money::from_paise(900),
            }
        );

        let walk_in = sale(PaymentKind::Cash, 700, None);
        assert!(matches!(
            plan_credit_edit(&walk_in, None, PaymentKind::Credit, walk_in.amount()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_plan_credit_amount_change() {
        let credit = sale(PaymentKind::Credit, 500, Some("c"));
        let open = entry("e1", 500, CreditStatus::Open);
        let paid = entry("e1", 500, CreditStatus::Paid);

        assert_eq!(
            plan_credit_edit(&credit, Some(&open), PaymentKind::Credit, Money::from_paise(800))
                .unwrap(),
            CreditAction::UpdateAmount {
                entry_id: "e1".to_string(),
                amount: Money::from_paise(800),
            }
        );
        assert!(plan_credit_edit(&credit, Some(&paid), PaymentKind::Credit, Money::from_paise(800))
            .is_err());

        // Same kind, same amount: nothing to do, even when settled.
        assert_eq!(
            plan_credit_edit(&credit, Some(&paid), PaymentKind::Credit, credit.amount()).unwrap(),
            CreditAction::None
        );
    }

    #[test]
    fn test_plan_cash_to_upi_is_noop() {
        let cash = sale(PaymentKind::Cash, 500, None);
        assert_eq!(
            plan_credit_edit(&cash, None, PaymentKind::Upi, Money::from_paise(600)).unwrap(),
            CreditAction::None
        );
    }
}
