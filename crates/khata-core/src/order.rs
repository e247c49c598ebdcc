//! # Order Math
//!
//! Pure rules for turning a cart into an order: line pricing from the
//! catalog, offer discounts, the delivery surcharge, totals, profit and
//! the status machine. The order service runs these inside its
//! transaction; nothing here touches the database.
//!
//! ## Pricing Pipeline
//! ```text
//! items ──► price_lines ──► subtotal ──► offer_discount ──► total
//!              │                              │               ▲
//!              │ catalog price/cost           │ clamp to      │
//!              │ stock check                  │ subtotal      │
//!              ▼                              ▼               │
//!          LineDraft[]                 discount       delivery_charge
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, OfferRejection, ValidationError};
use crate::money::Money;
use crate::MAX_AMOUNT_PAISE;
use crate::types::{
    DiscountKind, FulfillmentMethod, Offer, OrderItemInput, OrderLine, OrderStatus, Product,
};

// =============================================================================
// Status Machine
// =============================================================================

/// Returns true if `from → to` is an edge of the order state machine.
/// Staying in the same status is not a transition.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Accepted)
            | (Pending, Cancelled)
            | (Pending, Rejected)
            | (Accepted, Ready)
            | (Accepted, Rejected)
            | (Ready, Collected)
    )
}

/// Validates a status change for an order with the given lines.
///
/// Acceptance of an order that contains ad-hoc lines needs a human to have
/// confirmed the prices first.
pub fn check_transition(
    from: OrderStatus,
    to: OrderStatus,
    lines: &[OrderLine],
    price_verified: bool,
) -> CoreResult<()> {
    if !is_valid_transition(from, to) {
        return Err(CoreError::InvalidStatusTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    if to == OrderStatus::Accepted && !price_verified && lines.iter().any(OrderLine::is_ad_hoc) {
        return Err(CoreError::conflict(
            "order has items without catalog prices; verify prices before accepting",
        ));
    }

    Ok(())
}

/// Validates a price verification: PENDING orders only, and every line
/// must carry a positive price.
pub fn check_price_verification(status: OrderStatus, lines: &[OrderLine]) -> CoreResult<()> {
    if status != OrderStatus::Pending {
        return Err(CoreError::conflict(format!(
            "only PENDING orders can be price-verified (order is {})",
            status
        )));
    }

    if let Some(line) = lines.iter().find(|line| line.unit_price_paise <= 0) {
        return Err(CoreError::conflict(format!(
            "item '{}' has no price",
            line.name
        )));
    }

    Ok(())
}

// =============================================================================
// Line Pricing
// =============================================================================

/// A priced line before it has an order id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDraft {
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_cost: Money,
}

impl LineDraft {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    #[inline]
    pub fn cost_total(&self) -> Money {
        self.unit_cost.multiply_quantity(self.quantity)
    }

    /// Gives the draft an id and a place in the order.
    pub fn into_line(self, order_id: &str, position: i64) -> OrderLine {
        let line_total_paise = self.line_total().paise();
        OrderLine {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            position,
            product_id: self.product_id,
            name: self.name,
            quantity: self.quantity,
            unit_price_paise: self.unit_price.paise(),
            unit_cost_paise: self.unit_cost.paise(),
            line_total_paise,
        }
    }
}

/// Prices the cart against the shop's catalog.
///
/// `products` holds the catalog rows fetched for the cart, keyed by id.
/// Catalog lines take price and cost from the product; ad-hoc lines take
/// the client's price and have no cost. Stock is checked against the total
/// requested per product, so two lines for the same product cannot each
/// pass on their own. A line worth more than [`MAX_AMOUNT_PAISE`] is
/// rejected.
pub fn price_lines(
    items: &[OrderItemInput],
    products: &HashMap<String, Product>,
) -> CoreResult<Vec<LineDraft>> {
    let mut requested: HashMap<&str, i64> = HashMap::new();
    let mut drafts = Vec::with_capacity(items.len());

    for item in items {
        match item {
            OrderItemInput::Catalog {
                product_id,
                quantity,
            } => {
                let product = products
                    .get(product_id)
                    .filter(|p| p.is_active)
                    .ok_or_else(|| CoreError::not_found("Product", product_id))?;

                let total = requested.entry(product_id.as_str()).or_insert(0);
                *total += quantity;
                if *total > product.stock {
                    return Err(CoreError::InsufficientStock {
                        product: product.name.clone(),
                        available: product.stock,
                        requested: *total,
                    });
                }

                drafts.push(LineDraft {
                    product_id: Some(product.id.clone()),
                    name: product.name.clone(),
                    quantity: *quantity,
                    unit_price: product.price(),
                    unit_cost: product.cost(),
                });
            }
            OrderItemInput::AdHoc {
                name,
                quantity,
                unit_price_paise,
            } => drafts.push(LineDraft {
                product_id: None,
                name: name.trim().to_string(),
                quantity: *quantity,
                unit_price: Money::from_paise(*unit_price_paise),
                unit_cost: Money::zero(),
            }),
        }
    }

    for draft in &drafts {
        draft
            .unit_price
            .checked_multiply_quantity(draft.quantity)
            .filter(|total| total.paise() <= MAX_AMOUNT_PAISE)
            .ok_or_else(cart_too_large)?;
    }
    Ok(drafts)
}

/// Total requested quantity per catalog product.
pub fn stock_demand(lines: &[OrderLine]) -> HashMap<String, i64> {
    let mut demand = HashMap::new();
    for line in lines {
        if let Some(product_id) = &line.product_id {
            *demand.entry(product_id.clone()).or_insert(0) += line.quantity;
        }
    }
    demand
}

/// Sum of the line totals, capped at [`MAX_AMOUNT_PAISE`] so the collected
/// order still fits in one sale.
pub fn subtotal(drafts: &[LineDraft]) -> CoreResult<Money> {
    drafts
        .iter()
        .try_fold(Money::zero(), |sum, draft| {
            draft
                .unit_price
                .checked_multiply_quantity(draft.quantity)
                .and_then(|line| sum.checked_add(line))
        })
        .filter(|total| total.paise() <= MAX_AMOUNT_PAISE)
        .ok_or_else(cart_too_large)
}

fn cart_too_large() -> CoreError {
    ValidationError::OutOfRange {
        field: "items".to_string(),
        min: 0,
        max: MAX_AMOUNT_PAISE,
    }
    .into()
}

// =============================================================================
// Offers
// =============================================================================

/// Checks an offer against the cart and returns the discount.
///
/// FLAT takes `discount_value` paise; PERCENTAGE takes `discount_value`
/// basis points of the subtotal, capped by `max_discount_paise`. The result
/// never exceeds the subtotal.
pub fn offer_discount(
    offer: &Offer,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<Money, OfferRejection> {
    if !offer.is_active {
        return Err(OfferRejection::Inactive);
    }
    if now < offer.valid_from {
        return Err(OfferRejection::NotStarted);
    }
    if matches!(offer.valid_until, Some(until) if now > until) {
        return Err(OfferRejection::Expired);
    }
    if matches!(offer.usage_limit, Some(limit) if offer.used_count >= limit) {
        return Err(OfferRejection::UsageLimitReached);
    }

    let minimum = Money::from_paise(offer.min_order_paise);
    if subtotal < minimum {
        return Err(OfferRejection::BelowMinimum { minimum });
    }

    let discount = match offer.discount_kind {
        DiscountKind::Flat => Money::from_paise(offer.discount_value),
        DiscountKind::Percentage => {
            let raw = subtotal.percentage(offer.discount_value);
            match offer.max_discount_paise {
                Some(cap) => raw.min(Money::from_paise(cap)),
                None => raw,
            }
        }
    };

    Ok(discount.clamp_to(subtotal))
}

// =============================================================================
// Delivery, Totals, Profit
// =============================================================================

/// Flat delivery surcharge.
///
/// Charged only for DELIVERY orders that contain at least one catalog line
/// with a nonzero price. An order made purely of unpriced ad-hoc lines
/// ships free until the shop prices it.
pub fn delivery_charge(method: FulfillmentMethod, drafts: &[LineDraft], flat: Money) -> Money {
    let has_priced_catalog_line = drafts
        .iter()
        .any(|d| d.product_id.is_some() && d.unit_price.is_positive());

    if method == FulfillmentMethod::Delivery && has_priced_catalog_line {
        flat
    } else {
        Money::zero()
    }
}

/// `max(0, subtotal − discount) + delivery`
pub fn order_total(subtotal: Money, discount: Money, delivery: Money) -> Money {
    (subtotal - discount).clamp_to(subtotal) + delivery
}

/// `total − Σ(cost × qty)`
pub fn order_profit(total: Money, lines: &[OrderLine]) -> Money {
    total - lines.iter().map(OrderLine::cost_total).sum::<Money>()
}

/// When a pickup order should be ready. Delivery orders get no estimate.
pub fn estimated_ready_at(
    method: FulfillmentMethod,
    now: DateTime<Utc>,
    pickup_eta_minutes: i64,
) -> Option<DateTime<Utc>> {
    match method {
        FulfillmentMethod::Pickup => Some(now + Duration::minutes(pickup_eta_minutes)),
        FulfillmentMethod::Delivery => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64, cost: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            shop_id: "shop-1".to_string(),
            name: format!("Product {id}"),
            price_paise: price,
            cost_paise: cost,
            stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog(id: &str, quantity: i64) -> OrderItemInput {
        OrderItemInput::Catalog {
            product_id: id.to_string(),
            quantity,
        }
    }

    fn ad_hoc(price: i64) -> OrderItemInput {
        OrderItemInput::AdHoc {
            name: "Loose dal".to_string(),
            quantity: 1,
            unit_price_paise: price,
        }
    }

    fn offer(kind: DiscountKind, value: i64, cap: Option<i64>) -> Offer {
        Offer {
            id: "o1".to_string(),
            shop_id: "shop-1".to_string(),
            code: "DIWALI".to_string(),
            discount_kind: kind,
            discount_value: value,
            max_discount_paise: cap,
            min_order_paise: 0,
            usage_limit: None,
            used_count: 0,
            valid_from: Utc::now() - Duration::days(1),
            valid_until: None,
            is_active: true,
        }
    }

    fn catalog_map(products: Vec<Product>) -> HashMap<String, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    fn line(product_id: Option<&str>, price: i64) -> OrderLine {
        LineDraft {
            product_id: product_id.map(str::to_string),
            name: "x".to_string(),
            quantity: 1,
            unit_price: Money::from_paise(price),
            unit_cost: Money::zero(),
        }
        .into_line("order-1", 0)
    }

    #[test]
    fn test_transitions() {
        use OrderStatus::*;
        assert!(is_valid_transition(Pending, Accepted));
        assert!(is_valid_transition(Pending, Cancelled));
        assert!(is_valid_transition(Accepted, Rejected));
        assert!(is_valid_transition(Ready, Collected));

        assert!(!is_valid_transition(Accepted, Cancelled));
        assert!(!is_valid_transition(Ready, Rejected));
        assert!(!is_valid_transition(Pending, Collected));
        assert!(!is_valid_transition(Collected, Pending));
        assert!(!is_valid_transition(Pending, Pending));
    }

    #[test]
    fn test_accept_requires_verification_for_ad_hoc() {
        let lines = vec![line(None, 500)];
        let result = check_transition(OrderStatus::Pending, OrderStatus::Accepted, &lines, false);
        assert!(matches!(result, Err(CoreError::Conflict(_))));
        assert!(check_transition(OrderStatus::Pending, OrderStatus::Accepted, &lines, true).is_ok());

        let catalog_only = vec![line(Some("p1"), 500)];
        assert!(
            check_transition(OrderStatus::Pending, OrderStatus::Accepted, &catalog_only, false)
                .is_ok()
        );
    }

    #[test]
    fn test_price_verification_rules() {
        assert!(check_price_verification(OrderStatus::Pending, &[line(None, 100)]).is_ok());
        assert!(check_price_verification(OrderStatus::Pending, &[line(None, 0)]).is_err());
        assert!(check_price_verification(OrderStatus::Accepted, &[line(None, 100)]).is_err());
    }

    #[test]
    fn test_price_lines_uses_catalog_price() {
        let products = catalog_map(vec![product("p1", 4_500, 4_000, 10)]);
        let drafts = price_lines(&[catalog("p1", 2), ad_hoc(1_000)], &products).unwrap();

        assert_eq!(drafts[0].unit_price.paise(), 4_500);
        assert_eq!(drafts[0].unit_cost.paise(), 4_000);
        assert_eq!(drafts[1].unit_cost, Money::zero());
        assert_eq!(subtotal(&drafts).unwrap().paise(), 10_000);
    }

    #[test]
    fn test_price_lines_stock() {
        let products = catalog_map(vec![product("p1", 100, 50, 3)]);

        assert!(price_lines(&[catalog("p1", 3)], &products).is_ok());
        assert!(matches!(
            price_lines(&[catalog("p1", 4)], &products),
            Err(CoreError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            })
        ));
        // Split across two lines still counts against the same stock.
        assert!(matches!(
            price_lines(&[catalog("p1", 2), catalog("p1", 2)], &products),
            Err(CoreError::InsufficientStock { requested: 4, .. })
        ));
    }

    #[test]
    fn test_oversized_cart_is_rejected() {
        let products = catalog_map(vec![product("p1", MAX_AMOUNT_PAISE, 0, 1_000)]);

        // One line past the ceiling.
        let big_line = OrderItemInput::AdHoc {
            name: "Gold".to_string(),
            quantity: 2,
            unit_price_paise: MAX_AMOUNT_PAISE,
        };
        assert!(matches!(
            price_lines(&[big_line], &products),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // Each line fits, the sum does not.
        let drafts = price_lines(&[catalog("p1", 1), ad_hoc(1)], &products).unwrap();
        assert!(matches!(
            subtotal(&drafts),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // Arithmetic that would wrap is caught instead of panicking.
        let wrapping = vec![LineDraft {
            product_id: None,
            name: "x".to_string(),
            quantity: 2,
            unit_price: Money::from_paise(i64::MAX / 2 + 1),
            unit_cost: Money::zero(),
        }];
        assert!(subtotal(&wrapping).is_err());
    }

    #[test]
    fn test_price_lines_unknown_or_inactive_product() {
        let mut inactive = product("p2", 100, 50, 3);
        inactive.is_active = false;
        let products = catalog_map(vec![inactive]);

        assert!(matches!(
            price_lines(&[catalog("missing", 1)], &products),
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(
            price_lines(&[catalog("p2", 1)], &products),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_percentage_discount_capped() {
        // 20% of ₹1000 is ₹200, capped at ₹30.
        let o = offer(DiscountKind::Percentage, 2_000, Some(3_000));
        let discount = offer_discount(&o, Money::from_rupees(1000), Utc::now()).unwrap();
        assert_eq!(discount, Money::from_rupees(30));
    }

    #[test]
    fn test_flat_discount_clamped_to_subtotal() {
        let o = offer(DiscountKind::Flat, 50_000, None);
        let discount = offer_discount(&o, Money::from_rupees(100), Utc::now()).unwrap();
        assert_eq!(discount, Money::from_rupees(100));
    }

    #[test]
    fn test_offer_rejections() {
        let now = Utc::now();

        let mut o = offer(DiscountKind::Flat, 100, None);
        o.is_active = false;
        assert_eq!(offer_discount(&o, Money::from_rupees(10), now), Err(OfferRejection::Inactive));

        let mut o = offer(DiscountKind::Flat, 100, None);
        o.valid_from = now + Duration::hours(1);
        assert_eq!(offer_discount(&o, Money::from_rupees(10), now), Err(OfferRejection::NotStarted));

        let mut o = offer(DiscountKind::Flat, 100, None);
        o.valid_until = Some(now - Duration::hours(1));
        assert_eq!(offer_discount(&o, Money::from_rupees(10), now), Err(OfferRejection::Expired));

        let mut o = offer(DiscountKind::Flat, 100, None);
        o.usage_limit = Some(5);
        o.used_count = 5;
        assert_eq!(
            offer_discount(&o, Money::from_rupees(10), now),
            Err(OfferRejection::UsageLimitReached)
        );

        let mut o = offer(DiscountKind::Flat, 100, None);
        o.min_order_paise = 50_000;
        assert!(matches!(
            offer_discount(&o, Money::from_rupees(10), now),
            Err(OfferRejection::BelowMinimum { .. })
        ));
    }

    #[test]
    fn test_delivery_charge_rule() {
        let flat = Money::from_rupees(30);
        let products = catalog_map(vec![product("p1", 4_500, 4_000, 10)]);

        let free = price_lines(&[ad_hoc(0), ad_hoc(0)], &products).unwrap();
        assert_eq!(delivery_charge(FulfillmentMethod::Delivery, &free, flat), Money::zero());

        // A priced ad-hoc line alone does not trigger the surcharge.
        let ad_hoc_only = price_lines(&[ad_hoc(900)], &products).unwrap();
        assert_eq!(delivery_charge(FulfillmentMethod::Delivery, &ad_hoc_only, flat), Money::zero());

        let priced = price_lines(&[catalog("p1", 1), ad_hoc(0)], &products).unwrap();
        assert_eq!(delivery_charge(FulfillmentMethod::Delivery, &priced, flat), flat);
        assert_eq!(delivery_charge(FulfillmentMethod::Pickup, &priced, flat), Money::zero());
    }

    #[test]
    fn test_total_and_profit() {
        let total = order_total(
            Money::from_rupees(100),
            Money::from_rupees(10),
            Money::from_rupees(30),
        );
        assert_eq!(total, Money::from_rupees(120));

        // Discount larger than the subtotal never makes the total negative.
        let total = order_total(Money::from_rupees(10), Money::from_rupees(50), Money::zero());
        assert_eq!(total, Money::zero());

        let mut sold = line(Some("p1"), 4_500);
        sold.quantity = 2;
        sold.unit_cost_paise = 4_000;
        assert_eq!(
            order_profit(Money::from_paise(9_000), &[sold]).paise(),
            1_000
        );
    }

    #[test]
    fn test_stock_demand_ignores_ad_hoc() {
        let mut a = line(Some("p1"), 100);
        a.quantity = 2;
        let mut b = line(Some("p1"), 100);
        b.quantity = 3;
        let demand = stock_demand(&[a, b, line(None, 100)]);
        assert_eq!(demand.len(), 1);
        assert_eq!(demand["p1"], 5);
    }

    #[test]
    fn test_estimated_ready_at() {
        let now = Utc::now();
        assert_eq!(
            estimated_ready_at(FulfillmentMethod::Pickup, now, 30),
            Some(now + Duration::minutes(30))
        );
        assert_eq!(estimated_ready_at(FulfillmentMethod::Delivery, now, 30), None);
    }
}
