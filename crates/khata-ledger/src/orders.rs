//! # Order Settlement
//!
//! Turns a cart into a persisted order, moves it through its status
//! machine and, on collection, folds it into the ledger as a sale.
//!
//! ## Status Machine
//! ```text
//!   PENDING ──► ACCEPTED ──► READY ──► COLLECTED ──► (sale recorded)
//!      │  ▲          │
//!      │  └ needs priceVerified when the order has ad-hoc items
//!      │             │
//!      ├──► CANCELLED│
//!      └──► REJECTED ◄┘
//! ```
//!
//! ## create_order (one transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ 1. fetch catalog products for the cart (one query)                     │
//! │ 2. price lines: catalog price/cost, ad-hoc client price; stock check   │
//! │ 3. redeem offer code (validate + usage increment)                      │
//! │ 4. deduct stock (guarded UPDATE per product)                           │
//! │ 5. delivery charge, total, pickup ETA                                  │
//! │ 6. insert order + lines                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Any failure rolls back everything, including stock and offer usage.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use khata_core::order::{
    check_price_verification, check_transition, delivery_charge, estimated_ready_at,
    order_profit, order_total, price_lines, stock_demand, subtotal as cart_subtotal,
};
use khata_core::validation::{validate_id, validate_order_items};
use khata_core::{
    CoreError, Money, NewOrder, NewSale, Order, OrderItemInput, OrderLine, OrderStatus, Product,
    Sale, SaleOrigin,
};
use khata_db::{Database, OrderRepository, ProductRepository};

use crate::config::OrderSettings;
use crate::error::LedgerResult;
use crate::ledger::recorder::write_sale;
use crate::ledger::{require_customer, require_shop, LedgerService};
use crate::offers::OfferRedeemer;

/// Entry point for order operations.
#[derive(Clone)]
pub struct OrderService {
    db: Database,
    ledger: LedgerService,
    offers: Arc<dyn OfferRedeemer>,
    settings: OrderSettings,
}

impl OrderService {
    pub fn new(
        ledger: LedgerService,
        offers: Arc<dyn OfferRedeemer>,
        settings: OrderSettings,
    ) -> Self {
        OrderService {
            db: ledger.database().clone(),
            ledger,
            offers,
            settings,
        }
    }

    /// Creates a PENDING order from a cart.
    pub async fn create_order(&self, new_order: NewOrder) -> LedgerResult<Order> {
        debug!(
            shop_id = %new_order.shop_id,
            customer_id = %new_order.customer_id,
            items = new_order.items.len(),
            "Creating order"
        );
        validate_id("shop_id", &new_order.shop_id)?;
        validate_id("customer_id", &new_order.customer_id)?;
        validate_order_items(&new_order.items)?;

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        let method = new_order.fulfillment_method.unwrap_or_default();

        let mut tx = self.db.begin().await?;
        require_shop(&mut tx, &new_order.shop_id).await?;
        require_customer(&mut tx, &new_order.customer_id).await?;

        let products = load_products(&mut tx, &new_order.shop_id, &new_order.items).await?;
        let drafts = price_lines(&new_order.items, &products)?;
        let subtotal = cart_subtotal(&drafts)?;

        let (offer_id, discount) = match new_order
            .offer_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
        {
            Some(code) => {
                let (offer, discount) = self
                    .offers
                    .redeem(&mut tx, &new_order.shop_id, code, subtotal, now)
                    .await?;
                (Some(offer.id), discount)
            }
            None => (None, Money::zero()),
        };

        let delivery = delivery_charge(method, &drafts, self.settings.delivery_charge());
        let total = order_total(subtotal, discount, delivery);

        let items: Vec<OrderLine> = drafts
            .into_iter()
            .enumerate()
            .map(|(position, draft)| draft.into_line(&order_id, position as i64))
            .collect();
        deduct_stock(&mut tx, &stock_demand(&items), &products).await?;

        let order = Order {
            id: order_id,
            shop_id: new_order.shop_id.clone(),
            customer_id: new_order.customer_id.clone(),
            status: OrderStatus::Pending,
            items,
            subtotal_paise: subtotal.paise(),
            discount_paise: discount.paise(),
            delivery_charge_paise: delivery.paise(),
            total_paise: total.paise(),
            offer_id,
            payment_preference: new_order.payment_preference,
            fulfillment_method: method,
            price_verified: false,
            verified_by: None,
            verified_at: None,
            estimated_ready_at: estimated_ready_at(method, now, self.settings.pickup_eta_minutes),
            sale_id: None,
            created_at: now,
            updated_at: now,
        };
        OrderRepository::insert(&mut tx, &order).await?;
        tx.commit().await?;

        info!(
            order_id = %order.id,
            shop_id = %order.shop_id,
            total = %order.total(),
            discount = %discount,
            delivery = %delivery,
            "Order created"
        );
        Ok(order)
    }

    /// Moves an order along its status machine.
    ///
    /// CANCELLED and REJECTED put the order's stock back. COLLECTED records
    /// the ledger sale after the status change commits; if that write fails
    /// it is logged and the order stays COLLECTED without a sale.
    pub async fn update_order_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> LedgerResult<Order> {
        debug!(order_id, to = %new_status, "Updating order status");
        validate_id("order_id", order_id)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let mut order = require_order(&mut tx, order_id).await?;
        check_transition(order.status, new_status, &order.items, order.price_verified)?;

        if !OrderRepository::update_status(&mut tx, order_id, order.status, new_status, now).await? {
            return Err(CoreError::conflict(format!(
                "order {order_id} changed status concurrently"
            ))
            .into());
        }
        if matches!(new_status, OrderStatus::Cancelled | OrderStatus::Rejected) {
            restore_stock(&mut tx, &order.items).await?;
        }
        tx.commit().await?;

        let from = order.status;
        order.status = new_status;
        order.updated_at = now;
        info!(order_id, from = %from, to = %new_status, "Order status updated");

        if new_status == OrderStatus::Collected {
            self.settle(&mut order, now).await;
        }
        Ok(order)
    }

    /// Confirms the prices of a PENDING order so it can be accepted.
    pub async fn verify_order_price(&self, order_id: &str, verifier_id: &str) -> LedgerResult<Order> {
        debug!(order_id, verifier_id, "Verifying order prices");
        validate_id("order_id", order_id)?;
        validate_id("verifier_id", verifier_id)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let mut order = require_order(&mut tx, order_id).await?;
        check_price_verification(order.status, &order.items)?;
        OrderRepository::set_price_verified(&mut tx, order_id, verifier_id, now).await?;
        tx.commit().await?;

        order.price_verified = true;
        order.verified_by = Some(verifier_id.to_string());
        order.verified_at = Some(now);
        order.updated_at = now;

        info!(order_id, verifier_id, "Order prices verified");
        Ok(order)
    }

    /// Replaces an order's items and recomputes its total.
    ///
    /// The stored discount and delivery charge are kept, price verification
    /// is cleared, and stock moves from the old catalog lines to the new
    /// ones. `new_status` may not be ACCEPTED: a re-priced order has to be
    /// verified again first.
    pub async fn update_order_items(
        &self,
        order_id: &str,
        items: Vec<OrderItemInput>,
        new_status: Option<OrderStatus>,
    ) -> LedgerResult<Order> {
        debug!(order_id, items = items.len(), status = ?new_status, "Replacing order items");
        validate_id("order_id", order_id)?;
        validate_order_items(&items)?;
        if new_status == Some(OrderStatus::Accepted) {
            return Err(CoreError::conflict(
                "items were changed; verify prices before accepting the order",
            )
            .into());
        }

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let mut order = require_order(&mut tx, order_id).await?;
        if order.status.is_terminal() {
            return Err(CoreError::conflict(format!(
                "order {order_id} is {} and can no longer change",
                order.status
            ))
            .into());
        }

        let status = match new_status {
            Some(status) if status != order.status => {
                check_transition(order.status, status, &order.items, false)?;
                status
            }
            _ => order.status,
        };

        restore_stock(&mut tx, &order.items).await?;
        let products = load_products(&mut tx, &order.shop_id, &items).await?;
        let drafts = price_lines(&items, &products)?;
        let subtotal = cart_subtotal(&drafts)?;

        let lines: Vec<OrderLine> = drafts
            .into_iter()
            .enumerate()
            .map(|(position, draft)| draft.into_line(&order.id, position as i64))
            .collect();
        deduct_stock(&mut tx, &stock_demand(&lines), &products).await?;

        let discount = Money::from_paise(order.discount_paise);
        let delivery = Money::from_paise(order.delivery_charge_paise);
        let previous_status = order.status;

        order.items = lines;
        order.subtotal_paise = subtotal.paise();
        order.total_paise = order_total(subtotal, discount, delivery).paise();
        order.status = status;
        order.price_verified = false;
        order.verified_by = None;
        order.verified_at = None;
        order.updated_at = now;
        OrderRepository::replace_lines(&mut tx, &order).await?;
        if matches!(status, OrderStatus::Cancelled | OrderStatus::Rejected) {
            restore_stock(&mut tx, &order.items).await?;
        }
        tx.commit().await?;

        info!(order_id, total = %order.total(), status = %order.status, "Order items replaced");

        if status == OrderStatus::Collected && previous_status != OrderStatus::Collected {
            self.settle(&mut order, now).await;
        }
        Ok(order)
    }

    pub async fn get_order(&self, order_id: &str) -> LedgerResult<Order> {
        validate_id("order_id", order_id)?;
        let mut conn = self.db.acquire().await?;
        require_order(&mut conn, order_id).await
    }

    // =========================================================================
    // Collection
    // =========================================================================

    /// Best-effort fold of a collected order into the ledger.
    async fn settle(&self, order: &mut Order, now: DateTime<Utc>) {
        match self.record_collection(order, now).await {
            Ok(Some(sale)) => {
                info!(order_id = %order.id, sale_id = %sale.id, kind = %sale.kind, "Order settled into ledger");
                order.sale_id = Some(sale.id);
            }
            Ok(None) => {}
            Err(e) => error!(
                order_id = %order.id,
                shop_id = %order.shop_id,
                error = %e,
                "Failed to record sale for collected order"
            ),
        }
    }

    /// Records the collection sale and links it to the order. The credit
    /// limit is not checked: the goods have already left the shop.
    async fn record_collection(
        &self,
        order: &Order,
        now: DateTime<Utc>,
    ) -> LedgerResult<Option<Sale>> {
        let total = order.total();
        if !total.is_positive() {
            warn!(order_id = %order.id, "Collected order has no value, no sale recorded");
            return Ok(None);
        }

        let kind = order.settlement_kind();
        let new_sale = NewSale {
            shop_id: order.shop_id.clone(),
            amount_paise: total.paise(),
            kind,
            origin: SaleOrigin::Order,
            // A CASH/UPI sale carrying the customer would count as a
            // payment against their balance.
            customer_id: kind.is_credit().then(|| order.customer_id.clone()),
            notes: Some(format!("Order {}", order.id)),
            bypass_credit_limit: true,
        };

        let mut tx = self.db.begin().await?;
        let sale = write_sale(&mut tx, &new_sale, now).await?;
        OrderRepository::set_sale(&mut tx, &order.id, &sale.id).await?;
        tx.commit().await?;

        self.ledger.analytics().record_order(
            &order.shop_id,
            now,
            total,
            order_profit(total, &order.items),
        );
        Ok(Some(sale))
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn require_order(conn: &mut SqliteConnection, order_id: &str) -> LedgerResult<Order> {
    Ok(OrderRepository::get(conn, order_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Order", order_id))?)
}

/// Catalog rows for every catalog item in the cart, keyed by id.
async fn load_products(
    conn: &mut SqliteConnection,
    shop_id: &str,
    items: &[OrderItemInput],
) -> LedgerResult<HashMap<String, Product>> {
    let mut ids: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            OrderItemInput::Catalog { product_id, .. } => Some(product_id.clone()),
            OrderItemInput::AdHoc { .. } => None,
        })
        .collect();
    ids.sort();
    ids.dedup();

    Ok(ProductRepository::find_many(conn, shop_id, &ids)
        .await?
        .into_iter()
        .map(|product| (product.id.clone(), product))
        .collect())
}

/// Takes the demanded units out of stock. The UPDATE re-checks the level,
/// so a concurrent order that got there first turns into InsufficientStock.
async fn deduct_stock(
    conn: &mut SqliteConnection,
    demand: &HashMap<String, i64>,
    products: &HashMap<String, Product>,
) -> LedgerResult<()> {
    let mut wanted: Vec<(&String, i64)> = demand.iter().map(|(id, qty)| (id, *qty)).collect();
    wanted.sort();

    for (product_id, quantity) in wanted {
        if !ProductRepository::decrement_stock(conn, product_id, quantity).await? {
            let (name, available) = products
                .get(product_id)
                .map(|p| (p.name.clone(), p.stock))
                .unwrap_or_else(|| (product_id.clone(), 0));
            return Err(CoreError::InsufficientStock {
                product: name,
                available,
                requested: quantity,
            }
            .into());
        }
    }
    Ok(())
}

async fn restore_stock(conn: &mut SqliteConnection, lines: &[OrderLine]) -> LedgerResult<()> {
    for (product_id, quantity) in stock_demand(lines) {
        ProductRepository::restore_stock(conn, &product_id, quantity).await?;
    }
    Ok(())
}
