//! # Demo Data Seeder
//!
//! Populates a database with one shop's worth of demo data: customers
//! (with and without credit limits), a small kirana catalog, a couple of
//! offer codes and a short ledger history with open credit.
//!
//! ## Usage
//! ```bash
//! cargo run -p khata-db --bin seed
//! cargo run -p khata-db --bin seed -- --db ./data/khata.db
//! RUST_LOG=debug cargo run -p khata-db --bin seed
//! ```

use chrono::{Duration, Utc};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use khata_core::{
    CreditEntry, CreditStatus, Customer, DiscountKind, Money, Offer, PaymentKind, Product, Sale,
    SaleOrigin, Shop,
};
use khata_db::{
    CreditRepository, CustomerRepository, Database, DbConfig, OfferRepository, ProductRepository,
    SaleRepository, ShopRepository,
};

/// (name, price in paise, stock)
const CATALOG: &[(&str, i64, i64)] = &[
    ("Aashirvaad Atta 5kg", 26_500, 20),
    ("Tata Salt 1kg", 2_800, 50),
    ("Fortune Sunflower Oil 1L", 15_500, 24),
    ("Toor Dal 1kg", 16_000, 30),
    ("Amul Butter 100g", 5_600, 15),
    ("Parle-G 800g", 9_000, 40),
    ("Maggi Noodles 4-Pack", 5_600, 60),
    ("Surf Excel 1kg", 13_000, 12),
];

/// (name, phone, credit limit in rupees)
const CUSTOMERS: &[(&str, &str, Option<i64>)] = &[
    ("Ravi Kumar", "9800000001", Some(2_000)),
    ("Meena Devi", "9800000002", None),
    ("Suresh Patel", "9800000003", Some(500)),
];

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = env::var("KHATA_DATABASE_PATH").unwrap_or_else(|_| "./khata_dev.db".to_string());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Khata demo data seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./khata_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Connected, migrations applied");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shops")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        warn!(shops = existing, "Database already seeded; delete the file to regenerate");
        return Ok(());
    }

    let now = Utc::now();
    let mut tx = db.begin().await?;

    let shop = Shop {
        id: new_id(),
        name: "Sharma Kirana Store".to_string(),
        owner_id: new_id(),
        created_at: now,
    };
    ShopRepository::insert(&mut tx, &shop).await?;

    for (name, price_paise, stock) in CATALOG {
        let product = Product {
            id: new_id(),
            shop_id: shop.id.clone(),
            name: name.to_string(),
            price_paise: *price_paise,
            cost_paise: price_paise * 85 / 100,
            stock: *stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        ProductRepository::insert(&mut tx, &product).await?;
    }

    let mut customers = Vec::new();
    for (name, phone, limit_rupees) in CUSTOMERS {
        let customer = Customer {
            id: new_id(),
            name: name.to_string(),
            phone: Some(phone.to_string()),
            credit_limit_paise: limit_rupees.map(|r| Money::from_rupees(r).paise()),
            created_at: now,
        };
        CustomerRepository::insert(&mut tx, &customer).await?;
        customers.push(customer);
    }

    let offers = [
        ("WELCOME50", DiscountKind::Flat, 5_000, None, 20_000),
        ("DIWALI20", DiscountKind::Percentage, 2_000, Some(10_000), 50_000),
    ];
    for (code, kind, value, cap, min_order) in offers {
        let offer = Offer {
            id: new_id(),
            shop_id: shop.id.clone(),
            code: code.to_string(),
            discount_kind: kind,
            discount_value: value,
            max_discount_paise: cap,
            min_order_paise: min_order,
            usage_limit: Some(100),
            used_count: 0,
            valid_from: now - Duration::days(1),
            valid_until: Some(now + Duration::days(30)),
            is_active: true,
        };
        OfferRepository::insert(&mut tx, &offer).await?;
    }

    // A short history per customer: two credit bills and one part payment.
    let mut sales = 0;
    for (n, customer) in customers.iter().enumerate() {
        let history = [
            (PaymentKind::Credit, 30_000, 10),
            (PaymentKind::Credit, 12_000, 6),
            (PaymentKind::Cash, 15_000, 2),
        ];
        for (kind, amount_paise, days_ago) in history {
            let sale = Sale {
                id: new_id(),
                shop_id: shop.id.clone(),
                customer_id: Some(customer.id.clone()),
                amount_paise: amount_paise + (n as i64) * 1_000,
                kind,
                origin: if kind.is_credit() {
                    SaleOrigin::Manual
                } else {
                    SaleOrigin::Payment
                },
                notes: None,
                tags: Vec::new(),
                created_at: now - Duration::days(days_ago),
                edited_by: None,
                edited_at: None,
                edit_reason: None,
            };
            SaleRepository::insert(&mut tx, &sale).await?;

            if kind.is_credit() {
                let entry = CreditEntry {
                    id: new_id(),
                    shop_id: shop.id.clone(),
                    customer_id: customer.id.clone(),
                    sale_id: sale.id.clone(),
                    amount_paise: sale.amount_paise,
                    status: CreditStatus::Open,
                    created_at: sale.created_at,
                    closed_at: None,
                };
                CreditRepository::insert(&mut tx, &entry).await?;
            }
            sales += 1;
        }
    }

    tx.commit().await?;

    info!(
        shop_id = %shop.id,
        products = CATALOG.len(),
        customers = customers.len(),
        offers = offers.len(),
        sales,
        "Seed complete"
    );

    let mut conn = db.acquire().await?;
    for customer in &customers {
        let totals = SaleRepository::totals(&mut conn, &shop.id, &customer.id).await?;
        info!(customer = %customer.name, balance = %totals.balance(), "Opening balance");
    }

    Ok(())
}
