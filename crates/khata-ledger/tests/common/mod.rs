//! Shared setup for the service scenario tests.
//!
//! The in-memory pool has a single connection: every helper here acquires
//! and releases it before returning, so tests never hold a connection
//! while calling a service.

#![allow(dead_code)]

use khata_core::{CreditEntry, Customer, Money, NewSale, Offer, PaymentKind, Product, Sale, Shop};
use khata_db::{
    testing, CreditRepository, Database, DbConfig, OfferRepository, ProductRepository,
    SaleRepository,
};
use khata_ledger::{KhataServices, LedgerConfig};

pub struct Fixture {
    pub services: KhataServices,
    pub shop: Shop,
}

pub async fn setup() -> Fixture {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("khata_ledger=debug")
        .with_test_writer()
        .try_init();

    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("open in-memory database");
    let shop = {
        let mut conn = db.acquire().await.expect("acquire");
        testing::shop(&mut conn, "Sharma Kirana").await
    };

    let services = KhataServices::with_database(db, &LedgerConfig::default());
    Fixture { services, shop }
}

impl Fixture {
    pub async fn other_shop(&self) -> Shop {
        let mut conn = self.services.db.acquire().await.expect("acquire");
        testing::shop(&mut conn, "Gupta General Store").await
    }

    pub async fn customer(&self, name: &str, limit_rupees: Option<i64>) -> Customer {
        let mut conn = self.services.db.acquire().await.expect("acquire");
        testing::customer(&mut conn, name, limit_rupees.map(|r| Money::from_rupees(r).paise())).await
    }

    pub async fn product(&self, name: &str, price_rupees: i64, stock: i64) -> Product {
        let mut conn = self.services.db.acquire().await.expect("acquire");
        testing::product(
            &mut conn,
            &self.shop.id,
            name,
            Money::from_rupees(price_rupees).paise(),
            stock,
        )
        .await
    }

    pub async fn insert_offer(&self, offer: &Offer) {
        let mut conn = self.services.db.acquire().await.expect("acquire");
        OfferRepository::insert(&mut conn, offer).await.expect("insert offer");
    }

    pub async fn offer_used_count(&self, offer_id: &str) -> i64 {
        let mut conn = self.services.db.acquire().await.expect("acquire");
        OfferRepository::get(&mut conn, offer_id)
            .await
            .expect("get offer")
            .expect("offer exists")
            .used_count
    }

    pub async fn stock_of(&self, product_id: &str) -> i64 {
        let mut conn = self.services.db.acquire().await.expect("acquire");
        ProductRepository::get(&mut conn, product_id)
            .await
            .expect("get product")
            .expect("product exists")
            .stock
    }

    pub async fn entry_for(&self, sale_id: &str) -> Option<CreditEntry> {
        let mut conn = self.services.db.acquire().await.expect("acquire");
        CreditRepository::get_by_sale(&mut conn, sale_id)
            .await
            .expect("get credit entry")
    }

    pub async fn sale(&self, sale_id: &str) -> Option<Sale> {
        let mut conn = self.services.db.acquire().await.expect("acquire");
        SaleRepository::get(&mut conn, &self.shop.id, sale_id)
            .await
            .expect("get sale")
    }

    /// Runs raw SQL against the fixture's database, e.g. to make a table
    /// refuse writes.
    pub async fn execute(&self, sql: &str) {
        let mut conn = self.services.db.acquire().await.expect("acquire");
        sqlx::query(sql).execute(&mut *conn).await.expect("execute");
    }

    pub async fn balance(&self, customer_id: &str) -> Money {
        self.services
            .ledger
            .get_balance(&self.shop.id, customer_id)
            .await
            .expect("balance")
    }

    /// Records a MANUAL sale in this fixture's shop.
    pub async fn record(&self, customer_id: Option<&str>, rupees: i64, kind: PaymentKind) -> Sale {
        let mut new_sale = NewSale::manual(&self.shop.id, Money::from_rupees(rupees), kind);
        if let Some(customer_id) = customer_id {
            new_sale = new_sale.customer(customer_id);
        }
        self.services
            .ledger
            .record_sale(new_sale)
            .await
            .expect("record sale")
    }
}
