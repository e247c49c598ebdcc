mod common;

use std::collections::HashSet;

use khata_core::{DateRange, Money, PaymentKind, SaleOrigin, SalesFilter};

use common::setup;

#[tokio::test]
async fn test_sales_pages_cover_everything_once() {
    let fx = setup().await;
    let mut recorded = HashSet::new();
    for rupees in [10, 20, 30, 40, 50] {
        recorded.insert(fx.record(None, rupees, PaymentKind::Cash).await.id);
    }

    let filter = SalesFilter::default();
    let mut seen = Vec::new();
    let mut cursor = None;
    let mut pages = 0;
    loop {
        let page = fx
            .services
            .ledger
            .get_all_sales(&fx.shop.id, &filter, cursor.as_ref(), Some(2))
            .await
            .unwrap();
        pages += 1;
        assert!(page.sales.len() <= 2);
        seen.extend(page.sales.into_iter().map(|sale| sale.id));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 5);
    assert_eq!(seen.into_iter().collect::<HashSet<_>>(), recorded);
}

#[tokio::test]
async fn test_sales_filter_by_kind_and_origin() {
    let fx = setup().await;
    let ravi = fx.customer("Ravi", None).await;
    fx.record(Some(&ravi.id), 100, PaymentKind::Credit).await;
    fx.record(Some(&ravi.id), 40, PaymentKind::Cash).await;
    fx.record(None, 15, PaymentKind::Upi).await;

    let credit_only = SalesFilter {
        kind: Some(PaymentKind::Credit),
        ..Default::default()
    };
    let page = fx
        .services
        .ledger
        .get_all_sales(&fx.shop.id, &credit_only, None, None)
        .await
        .unwrap();
    assert_eq!(page.sales.len(), 1);
    assert!(page.next_cursor.is_none());

    let orders_only = SalesFilter {
        origin: Some(SaleOrigin::Order),
        ..Default::default()
    };
    let page = fx
        .services
        .ledger
        .get_all_sales(&fx.shop.id, &orders_only, None, None)
        .await
        .unwrap();
    assert!(page.sales.is_empty());
}

#[tokio::test]
async fn test_summary_splits_by_kind() {
    let fx = setup().await;
    let ravi = fx.customer("Ravi", None).await;
    fx.record(Some(&ravi.id), 500, PaymentKind::Credit).await;
    fx.record(Some(&ravi.id), 200, PaymentKind::Cash).await;
    fx.record(None, 75, PaymentKind::Upi).await;

    let summary = fx
        .services
        .ledger
        .get_sales_summary(&fx.shop.id, &DateRange::default())
        .await
        .unwrap();

    assert_eq!(summary.sale_count, 3);
    assert_eq!(summary.credit_paise, Money::from_rupees(500).paise());
    assert_eq!(summary.cash_paise, Money::from_rupees(200).paise());
    assert_eq!(summary.upi_paise, Money::from_rupees(75).paise());
    assert_eq!(summary.received_paise, Money::from_rupees(275).paise());
}

#[tokio::test]
async fn test_outstanding_balances_skip_settled_customers() {
    let fx = setup().await;
    let ravi = fx.customer("Ravi", None).await;
    let meena = fx.customer("Meena", None).await;
    let suresh = fx.customer("Suresh", None).await;

    fx.record(Some(&ravi.id), 300, PaymentKind::Credit).await;
    fx.record(Some(&meena.id), 900, PaymentKind::Credit).await;
    fx.record(Some(&suresh.id), 50, PaymentKind::Credit).await;
    fx.record(Some(&suresh.id), 50, PaymentKind::Cash).await;

    let balances = fx
        .services
        .ledger
        .get_outstanding_balances(&fx.shop.id)
        .await
        .unwrap();

    let ids: Vec<&str> = balances.iter().map(|b| b.customer_id.as_str()).collect();
    assert_eq!(ids, vec![meena.id.as_str(), ravi.id.as_str()]);
    assert_eq!(balances[0].balance_paise, Money::from_rupees(900).paise());
}
