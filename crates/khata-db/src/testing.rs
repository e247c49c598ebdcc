//! # Test Fixtures
//!
//! Builders and seeders shared by the tests of this crate and of
//! `khata-ledger` (enable the `testing` feature). Seeders insert and panic
//! on failure; builders only construct values.

use chrono::{Duration, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::repository::{CustomerRepository, ProductRepository, ShopRepository};
use khata_core::{
    CreditEntry, CreditStatus, Customer, DiscountKind, Offer, PaymentKind, Product, Sale,
    SaleOrigin, Shop,
};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Inserts a shop.
pub async fn shop(conn: &mut SqliteConnection, name: &str) -> Shop {
    let shop = Shop {
        id: new_id(),
        name: name.to_string(),
        owner_id: new_id(),
        created_at: Utc::now(),
    };
    ShopRepository::insert(conn, &shop)
        .await
        .expect("insert shop fixture");
    shop
}

/// Inserts a customer with an optional credit limit in paise.
pub async fn customer(
    conn: &mut SqliteConnection,
    name: &str,
    credit_limit_paise: Option<i64>,
) -> Customer {
    let customer = Customer {
        id: new_id(),
        name: name.to_string(),
        phone: None,
        credit_limit_paise,
        created_at: Utc::now(),
    };
    CustomerRepository::insert(conn, &customer)
        .await
        .expect("insert customer fixture");
    customer
}

/// Inserts an active product. Cost is 80% of price.
pub async fn product(
    conn: &mut SqliteConnection,
    shop_id: &str,
    name: &str,
    price_paise: i64,
    stock: i64,
) -> Product {
    let now = Utc::now();
    let product = Product {
        id: new_id(),
        shop_id: shop_id.to_string(),
        name: name.to_string(),
        price_paise,
        cost_paise: price_paise * 4 / 5,
        stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    ProductRepository::insert(conn, &product)
        .await
        .expect("insert product fixture");
    product
}

/// Builds an active, unlimited offer valid since yesterday.
pub fn offer(shop_id: &str, code: &str, kind: DiscountKind, value: i64) -> Offer {
    Offer {
        id: new_id(),
        shop_id: shop_id.to_string(),
        code: code.to_uppercase(),
        discount_kind: kind,
        discount_value: value,
        max_discount_paise: None,
        min_order_paise: 0,
        usage_limit: None,
        used_count: 0,
        valid_from: Utc::now() - Duration::days(1),
        valid_until: None,
        is_active: true,
    }
}

/// Builds a MANUAL sale.
pub fn sale(shop_id: &str, customer_id: Option<&str>, amount_paise: i64, kind: PaymentKind) -> Sale {
    Sale {
        id: new_id(),
        shop_id: shop_id.to_string(),
        customer_id: customer_id.map(str::to_string),
        amount_paise,
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

/// Builds the OPEN entry mirroring a CREDIT sale.
pub fn credit_entry(sale: &Sale) -> CreditEntry {
    CreditEntry {
        id: new_id(),
        shop_id: sale.shop_id.clone(),
        customer_id: sale.customer_id.clone().unwrap_or_default(),
        sale_id: sale.id.clone(),
        amount_paise: sale.amount_paise,
        status: CreditStatus::Open,
        created_at: sale.created_at,
        closed_at: None,
    }
}
