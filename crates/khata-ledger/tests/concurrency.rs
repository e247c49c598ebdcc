//! Concurrent writers on a file-backed ledger with a multi-connection pool.

use khata_core::{CoreError, Money, NewOrder, NewSale, OrderItemInput, PaymentKind};
use khata_db::{testing, Database, DbConfig};
use khata_ledger::{KhataServices, LedgerConfig, LedgerError};
use tempfile::TempDir;

async fn file_ledger(dir: &TempDir) -> Database {
    Database::new(DbConfig::new(dir.path().join("khata.db")).max_connections(8))
        .await
        .expect("open file ledger")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_credit_sales_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_ledger(&dir).await;
    let (shop, ravi) = {
        let mut conn = db.acquire().await.unwrap();
        let shop = testing::shop(&mut conn, "Sharma Kirana").await;
        let ravi = testing::customer(&mut conn, "Ravi", Some(Money::from_rupees(100_000).paise())).await;
        (shop, ravi)
    };
    let services = KhataServices::with_database(db, &LedgerConfig::default());

    let mut handles = Vec::new();
    for _ in 0..32 {
        let ledger = services.ledger.clone();
        let sale = NewSale::manual(&shop.id, Money::from_rupees(10), PaymentKind::Credit)
            .customer(&ravi.id);
        handles.push(tokio::spawn(async move { ledger.record_sale(sale).await }));
    }

    let mut failures = Vec::new();
    for handle in handles {
        if let Err(e) = handle.await.unwrap() {
            failures.push(e.to_string());
        }
    }
    assert!(failures.is_empty(), "failed writes: {failures:?}");

    let balance = services.ledger.get_balance(&shop.id, &ravi.id).await.unwrap();
    assert_eq!(balance, Money::from_rupees(320));
    let open = services
        .ledger
        .get_open_credit_entries(&shop.id, &ravi.id)
        .await
        .unwrap();
    assert_eq!(open.len(), 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_orders_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_ledger(&dir).await;
    let (shop, ravi, rice) = {
        let mut conn = db.acquire().await.unwrap();
        let shop = testing::shop(&mut conn, "Sharma Kirana").await;
        let ravi = testing::customer(&mut conn, "Ravi", None).await;
        let rice = testing::product(&mut conn, &shop.id, "Basmati 1kg", 12_000, 5).await;
        (shop, ravi, rice)
    };
    let services = KhataServices::with_database(db.clone(), &LedgerConfig::default());

    let mut handles = Vec::new();
    for _ in 0..12 {
        let orders = services.orders.clone();
        let new_order = NewOrder {
            shop_id: shop.id.clone(),
            customer_id: ravi.id.clone(),
            items: vec![OrderItemInput::Catalog {
                product_id: rice.id.clone(),
                quantity: 1,
            }],
            offer_code: None,
            payment_preference: None,
            fulfillment_method: None,
        };
        handles.push(tokio::spawn(async move { orders.create_order(new_order).await }));
    }

    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(LedgerError::Core(CoreError::InsufficientStock { .. })) => {}
            Err(other) => panic!("unexpected failure: {other:?}"),
        }
    }
    assert_eq!(placed, 5);

    let stock: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?")
        .bind(&rice.id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(stock, 0);
}
