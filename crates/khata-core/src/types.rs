//! # Domain Types
//!
//! Core domain types used throughout Khata.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │   │  CreditEntry    │   │     Order       │       │
//! │  │  (ledger log)   │◄──│  (open-credit   │   │  ─────────────  │       │
//! │  │  ─────────────  │1:1│   cache)        │   │  status machine │       │
//! │  │  amount_paise   │   │  status         │   │  items ─────────┼──┐    │
//! │  │  kind           │   │  sale_id (FK)   │   │  discount       │  │    │
//! │  │  origin         │   └─────────────────┘   │  delivery       │  │    │
//! │  └─────────────────┘                         └─────────────────┘  │    │
//! │                                                                    ▼    │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │  PaymentKind    │   │  CreditStatus   │   │ OrderItemInput      │   │
//! │  │  Cash Upi Credit│   │  Open → Paid    │   │  Catalog | AdHoc    │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shop Scoping
//! Customers have a global identity; every monetary record carries the
//! owning `shop_id` and every operation takes the shop explicitly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Payment Kind
// =============================================================================

/// How a sale was settled.
///
/// CREDIT means the shop extended credit (udhaar); CASH and UPI mean the
/// shop received money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    Cash,
    Upi,
    Credit,
}

impl PaymentKind {
    /// True for the kind that adds to a customer's balance.
    #[inline]
    pub const fn is_credit(&self) -> bool {
        matches!(self, PaymentKind::Credit)
    }

    /// True for kinds that reduce a customer's balance.
    #[inline]
    pub const fn is_payment(&self) -> bool {
        matches!(self, PaymentKind::Cash | PaymentKind::Upi)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Cash => "CASH",
            PaymentKind::Upi => "UPI",
            PaymentKind::Credit => "CREDIT",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CASH" => Ok(PaymentKind::Cash),
            "UPI" => Ok(PaymentKind::Upi),
            "CREDIT" | "UDHAAR" => Ok(PaymentKind::Credit),
            other => Err(ValidationError::InvalidFormat {
                field: "kind".to_string(),
                reason: format!("unknown payment kind '{}'", other),
            }),
        }
    }
}

/// How a customer settles an outstanding balance. A payment can never be
/// made "on credit", so this is the CASH/UPI subset of [`PaymentKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Upi,
}

impl From<PaymentMethod> for PaymentKind {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => PaymentKind::Cash,
            PaymentMethod::Upi => PaymentKind::Upi,
        }
    }
}

// =============================================================================
// Sale Origin
// =============================================================================

/// Which workflow produced a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleOrigin {
    /// Entered by the shopkeeper at the counter.
    Manual,
    /// Folded in from a collected order.
    Order,
    /// A customer settling their balance.
    Payment,
}

// =============================================================================
// Sale
// =============================================================================

/// One monetary event in a shop's ledger.
///
/// ## Invariant
/// `amount_paise > 0`. The sign of the event comes from `kind`, never from
/// the amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub shop_id: String,
    pub customer_id: Option<String>,
    pub amount_paise: i64,
    pub kind: PaymentKind,
    pub origin: SaleOrigin,
    pub notes: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub tags: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Who last edited this sale.
    pub edited_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub edited_at: Option<DateTime<Utc>>,
    pub edit_reason: Option<String>,
}

impl Sale {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }

    /// Signed effect of this sale on the customer's balance.
    #[inline]
    pub fn balance_effect(&self) -> Money {
        if self.kind.is_credit() {
            self.amount()
        } else {
            -self.amount()
        }
    }
}

// =============================================================================
// Credit Entry
// =============================================================================

/// Status of an open-credit cache row. Moves OPEN → PAID only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditStatus {
    Open,
    Paid,
}

/// Best-effort index of which credit bills are still outstanding.
///
/// This row is a convenience for "which bills are open" screens. It is NOT
/// a balance: partial payments never close an entry, so an entry may stay
/// OPEN after the customer's balance has reached zero. Balance questions go
/// through the sale log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditEntry {
    pub id: String,
    pub shop_id: String,
    pub customer_id: String,
    /// The CREDIT sale this entry mirrors.
    pub sale_id: String,
    pub amount_paise: i64,
    pub status: CreditStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl CreditEntry {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == CreditStatus::Paid
    }
}

// =============================================================================
// Shop & Customer
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shop {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A customer known across shops.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    /// Maximum balance the customer may run up. `None` means unlimited.
    pub credit_limit_paise: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn credit_limit(&self) -> Option<Money> {
        self.credit_limit_paise.map(Money::from_paise)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product. Prices on orders always come from here, never from
/// the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub price_paise: i64,
    /// Purchase cost, for profit tracking.
    pub cost_paise: i64,
    pub stock: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_paise(self.cost_paise)
    }
}

// =============================================================================
// Offer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// `discount_value` is an amount in paise.
    Flat,
    /// `discount_value` is in basis points (2000 = 20%).
    Percentage,
}

/// A shop's discount code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Offer {
    pub id: String,
    pub shop_id: String,
    /// Stored upper-case; lookups normalise the requested code.
    pub code: String,
    pub discount_kind: DiscountKind,
    pub discount_value: i64,
    /// Cap for percentage discounts.
    pub max_discount_paise: Option<i64>,
    pub min_order_paise: i64,
    /// `None` means unlimited redemptions.
    pub usage_limit: Option<i64>,
    pub used_count: i64,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

// =============================================================================
// Orders
// =============================================================================

/// Order lifecycle.
///
/// ```text
///   PENDING ──► ACCEPTED ──► READY ──► COLLECTED
///     │  │         │
///     │  └─────────┴──► REJECTED   (shop)
///     └──► CANCELLED               (customer)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Ready,
    Collected,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Ready => "READY",
            OrderStatus::Collected => "COLLECTED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
        }
    }

    /// No transitions leave a terminal status.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Collected | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentMethod {
    #[default]
    Pickup,
    Delivery,
}

/// A line requested by the client.
///
/// The variant decides where the price comes from: a catalog line carries
/// no price at all (the catalog is authoritative), an ad-hoc line carries a
/// client price that must be verified by a human before acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum OrderItemInput {
    Catalog {
        product_id: String,
        quantity: i64,
    },
    AdHoc {
        name: String,
        quantity: i64,
        unit_price_paise: i64,
    },
}

impl OrderItemInput {
    pub fn quantity(&self) -> i64 {
        match self {
            OrderItemInput::Catalog { quantity, .. } | OrderItemInput::AdHoc { quantity, .. } => {
                *quantity
            }
        }
    }
}

/// A persisted order line (snapshot of name/price/cost at order time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub position: i64,
    /// `None` for ad-hoc lines.
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub unit_price_paise: i64,
    pub unit_cost_paise: i64,
    pub line_total_paise: i64,
}

impl OrderLine {
    #[inline]
    pub fn is_ad_hoc(&self) -> bool {
        self.product_id.is_none()
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_paise(self.line_total_paise)
    }

    #[inline]
    pub fn cost_total(&self) -> Money {
        Money::from_paise(self.unit_cost_paise).multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub shop_id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<OrderLine>,
    pub subtotal_paise: i64,
    pub discount_paise: i64,
    pub delivery_charge_paise: i64,
    pub total_paise: i64,
    pub offer_id: Option<String>,
    /// Kind of the sale recorded on collection. `None` settles as CREDIT.
    pub payment_preference: Option<PaymentKind>,
    pub fulfillment_method: FulfillmentMethod,
    pub price_verified: bool,
    pub verified_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub verified_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub estimated_ready_at: Option<DateTime<Utc>>,
    /// Ledger sale recorded when the order was collected.
    pub sale_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }

    #[inline]
    pub fn has_ad_hoc_items(&self) -> bool {
        self.items.iter().any(OrderLine::is_ad_hoc)
    }

    /// Kind used when folding the order into the ledger.
    #[inline]
    pub fn settlement_kind(&self) -> PaymentKind {
        self.payment_preference.unwrap_or(PaymentKind::Credit)
    }
}

// =============================================================================
// Audit & Analytics
// =============================================================================

/// One audit-log row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AuditEntry {
    pub id: String,
    pub shop_id: String,
    pub actor_id: String,
    /// e.g. "transactions.bulk_update", "transactions.delete"
    pub action: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    #[ts(type = "unknown")]
    pub detail: serde_json::Value,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Per-shop, per-day counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailyAnalytics {
    pub shop_id: String,
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub views: i64,
    pub orders: i64,
    pub revenue_paise: i64,
    pub profit_paise: i64,
}

/// An increment to apply to a shop's daily counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsDelta {
    pub shop_id: String,
    pub day: NaiveDate,
    pub views: i64,
    pub orders: i64,
    pub revenue_paise: i64,
    pub profit_paise: i64,
}

// =============================================================================
// Requests
// =============================================================================

/// Input for recording a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub shop_id: String,
    pub amount_paise: i64,
    pub kind: PaymentKind,
    pub origin: SaleOrigin,
    pub customer_id: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub bypass_credit_limit: bool,
}

impl NewSale {
    /// A counter sale entered by the shopkeeper.
    pub fn manual(shop_id: impl Into<String>, amount: Money, kind: PaymentKind) -> Self {
        NewSale {
            shop_id: shop_id.into(),
            amount_paise: amount.paise(),
            kind,
            origin: SaleOrigin::Manual,
            customer_id: None,
            notes: None,
            bypass_credit_limit: false,
        }
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn bypass_credit_limit(mut self) -> Self {
        self.bypass_credit_limit = true;
        self
    }
}

/// Input for recording a payment against a customer's balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPayment {
    pub shop_id: String,
    pub customer_id: String,
    pub amount_paise: i64,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

/// Result of a payment: the new ledger row, the credit entries it closed,
/// and the customer's balance afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentReceipt {
    pub sale: Sale,
    pub updated_credit_entries: Vec<CreditEntry>,
    pub new_balance_paise: i64,
}

/// Changes to a single transaction. `None` fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionUpdate {
    pub amount_paise: Option<i64>,
    pub kind: Option<PaymentKind>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub edit_reason: String,
    pub editor_id: String,
}

/// Changes applied to many transactions at once.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkTransactionUpdate {
    pub sale_ids: Vec<String>,
    pub kind: Option<PaymentKind>,
    pub tags: Option<Vec<String>>,
    pub editor_id: String,
}

/// Number of rows touched by a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkResult {
    pub count: u64,
}

/// Input for creating an order from a cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub shop_id: String,
    pub customer_id: String,
    pub items: Vec<OrderItemInput>,
    pub offer_code: Option<String>,
    pub payment_preference: Option<PaymentKind>,
    pub fulfillment_method: Option<FulfillmentMethod>,
}

// =============================================================================
// Queries
// =============================================================================

/// Inclusive-exclusive creation-time window: `from <= created_at < to`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesFilter {
    pub customer_id: Option<String>,
    pub kind: Option<PaymentKind>,
    pub origin: Option<SaleOrigin>,
    #[serde(default)]
    pub range: DateRange,
}

/// Keyset position: the last sale of the previous page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesCursor {
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub id: String,
}

/// Newest-first page of sales.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesPage {
    pub sales: Vec<Sale>,
    pub next_cursor: Option<SalesCursor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub sale_count: i64,
    pub cash_paise: i64,
    pub upi_paise: i64,
    pub credit_paise: i64,
    /// cash + upi
    pub received_paise: i64,
    /// credit − received, over the range
    pub net_credit_paise: i64,
}

/// A customer's outstanding balance in one shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerBalance {
    pub customer_id: String,
    pub balance_paise: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(kind: PaymentKind, paise: i64) -> Sale {
        Sale {
            id: "s".to_string(),
            shop_id: "shop".to_string(),
            customer_id: Some("c".to_string()),
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

    #[test]
    fn test_payment_kind_parsing() {
        assert_eq!("cash".parse::<PaymentKind>().unwrap(), PaymentKind::Cash);
        assert_eq!("UPI".parse::<PaymentKind>().unwrap(), PaymentKind::Upi);
        assert_eq!("udhaar".parse::<PaymentKind>().unwrap(), PaymentKind::Credit);
        assert!("card".parse::<PaymentKind>().is_err());
    }

    #[test]
    fn test_payment_kind_serde() {
        let json = serde_json::to_string(&PaymentKind::Credit).unwrap();
        assert_eq!(json, "\"CREDIT\"");
        let kind: PaymentKind = serde_json::from_str("\"UPI\"").unwrap();
        assert_eq!(kind, PaymentKind::Upi);
    }

    #[test]
    fn test_balance_effect_sign() {
        assert_eq!(sale(PaymentKind::Credit, 500).balance_effect().paise(), 500);
        assert_eq!(sale(PaymentKind::Cash, 200).balance_effect().paise(), -200);
        assert_eq!(sale(PaymentKind::Upi, 300).balance_effect().paise(), -300);
    }

    #[test]
    fn test_order_item_input_is_tagged() {
        let json = r#"{"type":"ad_hoc","name":"Loose sugar","quantity":2,"unit_price_paise":4500}"#;
        let item: OrderItemInput = serde_json::from_str(json).unwrap();
        assert_eq!(
            item,
            OrderItemInput::AdHoc {
                name: "Loose sugar".to_string(),
                quantity: 2,
                unit_price_paise: 4500,
            }
        );

        // A catalog line has nowhere to put a client price.
        let json = r#"{"type":"catalog","product_id":"p1","quantity":1}"#;
        let item: OrderItemInput = serde_json::from_str(json).unwrap();
        assert_eq!(item.quantity(), 1);
    }

    #[test]
    fn test_order_status_terminal() {
        assert!(OrderStatus::Collected.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn test_new_sale_builder() {
        let req = NewSale::manual("shop", Money::from_rupees(5), PaymentKind::Credit)
            .customer("cust")
            .bypass_credit_limit();
        assert_eq!(req.amount_paise, 500);
        assert_eq!(req.customer_id.as_deref(), Some("cust"));
        assert!(req.bypass_credit_limit);
        assert_eq!(req.origin, SaleOrigin::Manual);
    }
}
