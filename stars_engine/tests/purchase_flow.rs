use stars_engine::{
    assets::AssetStore,
    db_types::{NewProduct, Product, ProductId, Stars, UserId},
    events::EventProducers,
    helpers::ValidationError,
    CatalogApi,
    LedgerApi,
    LedgerManagement,
    PurchaseFlowApi,
    PurchaseFlowError,
    SqliteDatabase,
};

mod support;
use support::{new_test_db, tear_down};

struct Shop {
    db: SqliteDatabase,
    catalog: CatalogApi<SqliteDatabase>,
    flow: PurchaseFlowApi<SqliteDatabase>,
    ledger: LedgerApi<SqliteDatabase>,
    _dir: tempfile::TempDir,
}

async fn new_shop() -> Shop {
    let db = new_test_db().await;
    let dir = tempfile::tempdir().unwrap();
    let catalog = CatalogApi::new(db.clone(), AssetStore::new(dir.path()));
    catalog.reload().await.unwrap();
    let flow = PurchaseFlowApi::new(db.clone(), catalog.cache(), EventProducers::default());
    let ledger = LedgerApi::new(db.clone());
    Shop { db, catalog, flow, ledger, _dir: dir }
}

async fn add_product(shop: &Shop, price: i64) -> Product {
    let product = NewProduct::new("Pack A", Stars::from(price), "x", "pack_a.zip");
    shop.catalog.add_product(product).await.unwrap()
}

#[tokio::test]
async fn purchase_scenario() {
    let shop = new_shop().await;
    let user = UserId(500);
    let product = add_product(&shop, 60).await;
    shop.ledger.grant(user, Stars::from(100)).await.unwrap();
    let purchases_before = shop.ledger.stats().await.unwrap().total_purchases;

    let quote = shop.flow.quote_purchase(user, product.id).await.unwrap();
    assert_eq!(quote.balance, Stars::from(100));
    assert_eq!(quote.balance_after, Stars::from(40));
    // Quoting writes nothing
    assert_eq!(shop.db.fetch_balance(user).await.unwrap(), Stars::from(100));

    let receipt = shop.flow.finalize_purchase(user, None, product.id).await.unwrap();
    assert_eq!(receipt.new_balance, Stars::from(40));
    assert_eq!(receipt.purchase.price, Stars::from(60));
    assert_eq!(receipt.product, product);
    assert_eq!(shop.db.fetch_balance(user).await.unwrap(), Stars::from(40));
    assert_eq!(shop.db.purchase_count(user).await.unwrap(), 1);
    let stats = shop.db.fetch_stats().await.unwrap();
    assert_eq!(stats.total_purchases, purchases_before + 1);
    tear_down(shop.db).await;
}

#[tokio::test]
async fn insufficient_funds_change_nothing() {
    let shop = new_shop().await;
    let user = UserId(501);
    let product = add_product(&shop, 60).await;
    shop.ledger.grant(user, Stars::from(59)).await.unwrap();

    let err = shop.flow.quote_purchase(user, product.id).await.unwrap_err();
    assert!(matches!(err, PurchaseFlowError::InsufficientFunds { balance, .. } if balance == Stars::from(59)));
    let err = shop.flow.finalize_purchase(user, None, product.id).await.unwrap_err();
    assert!(matches!(err, PurchaseFlowError::InsufficientFunds { required, .. } if required == Stars::from(60)));
    assert_eq!(shop.db.fetch_balance(user).await.unwrap(), Stars::from(59));
    assert_eq!(shop.db.purchase_count(user).await.unwrap(), 0);
    tear_down(shop.db).await;
}

#[tokio::test]
async fn products_deleted_mid_flow_are_not_sold() {
    let shop = new_shop().await;
    let user = UserId(502);
    let product = add_product(&shop, 10).await;
    shop.ledger.grant(user, Stars::from(100)).await.unwrap();
    shop.flow.quote_purchase(user, product.id).await.unwrap();
    shop.catalog.delete_product(product.id).await.unwrap();
    let err = shop.flow.finalize_purchase(user, None, product.id).await.unwrap_err();
    assert!(matches!(err, PurchaseFlowError::ProductNotFound(id) if id == product.id));
    assert_eq!(shop.db.fetch_balance(user).await.unwrap(), Stars::from(100));
    assert!(matches!(
        shop.flow.quote_purchase(user, ProductId(99)).await,
        Err(PurchaseFlowError::ProductNotFound(_))
    ));
    tear_down(shop.db).await;
}

#[tokio::test]
async fn concurrent_purchases_never_overdraw() {
    let shop = new_shop().await;
    let user = UserId(503);
    let product = add_product(&shop, 60).await;
    shop.ledger.grant(user, Stars::from(100)).await.unwrap();
    let (a, b, c) = tokio::join!(
        shop.flow.finalize_purchase(user, None, product.id),
        shop.flow.finalize_purchase(user, None, product.id),
        shop.flow.finalize_purchase(user, None, product.id),
    );
    let successes = [a, b, c].into_iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert_eq!(shop.db.fetch_balance(user).await.unwrap(), Stars::from(40));
    assert_eq!(shop.db.purchase_count(user).await.unwrap(), 1);
    tear_down(shop.db).await;
}

#[tokio::test]
async fn deposit_scenario() {
    let shop = new_shop().await;
    let user = UserId(504);
    let invoice = shop.flow.deposit_invoice(user, Stars::from(20)).unwrap();
    assert_eq!(invoice.payload, "stars_deposit_504_20");
    assert_eq!(invoice.amount, Stars::from(20));
    assert!(shop.flow.precheck(&invoice.payload));

    let receipt = shop.flow.confirm_deposit(&invoice.payload, invoice.amount, None).await.unwrap().unwrap();
    assert_eq!(receipt.new_balance, Stars::from(20));
    assert_eq!(receipt.deposit.amount, Stars::from(20));
    assert_eq!(shop.db.fetch_balance(user).await.unwrap(), Stars::from(20));
    let history = shop.db.deposit_history(user, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    let stats = shop.db.fetch_stats().await.unwrap();
    assert_eq!(stats.total_deposited, Stars::from(20));
    assert_eq!(stats.total_users, 1);
    tear_down(shop.db).await;
}

#[tokio::test]
async fn the_invoiced_amount_is_credited() {
    let shop = new_shop().await;
    let user = UserId(507);
    let invoice = shop.flow.deposit_invoice(user, Stars::from(30)).unwrap();
    // The provider reports a different total. The payload is what was invoiced, so it wins.
    let receipt = shop.flow.confirm_deposit(&invoice.payload, Stars::from(25), Some("carol")).await.unwrap().unwrap();
    assert_eq!(receipt.deposit.amount, Stars::from(30));
    assert_eq!(receipt.new_balance, Stars::from(30));
    assert_eq!(shop.db.fetch_balance(user).await.unwrap(), Stars::from(30));
    tear_down(shop.db).await;
}

#[tokio::test]
async fn deposit_amounts_are_validated() {
    let shop = new_shop().await;
    let user = UserId(505);
    assert!(matches!(
        shop.flow.deposit_invoice(user, Stars::from(9)),
        Err(ValidationError::BelowMinimum { .. })
    ));
    assert!(shop.flow.deposit_invoice(user, Stars::from(10)).is_ok());
    assert!(matches!(shop.flow.deposit_invoice_from_text(user, "ten"), Err(ValidationError::NotANumber(_))));
    assert!(matches!(shop.flow.deposit_invoice_from_text(user, "-10"), Err(ValidationError::NotPositive(_))));
    assert_eq!(shop.flow.deposit_invoice_from_text(user, " 15 ").unwrap().payload, "stars_deposit_505_15");
    tear_down(shop.db).await;
}

#[tokio::test]
async fn malformed_payloads_are_dropped() {
    let shop = new_shop().await;
    for payload in ["", "stars_deposit_505", "stars_deposit_x_20", "order_12_20"] {
        assert!(shop.flow.confirm_deposit(payload, Stars::from(20), None).await.unwrap().is_none());
    }
    let stats = shop.ledger.stats().await.unwrap();
    assert_eq!(stats.total_deposited, Stars::from(0));
    assert_eq!(stats.total_users, 0);
    tear_down(shop.db).await;
}

#[tokio::test]
async fn every_confirmation_is_credited() {
    let shop = new_shop().await;
    let user = UserId(506);
    let invoice = shop.flow.deposit_invoice(user, Stars::from(50)).unwrap();
    shop.flow.confirm_deposit(&invoice.payload, invoice.amount, None).await.unwrap();
    shop.flow.confirm_deposit(&invoice.payload, invoice.amount, None).await.unwrap();
    assert_eq!(shop.db.fetch_balance(user).await.unwrap(), Stars::from(100));
    assert_eq!(shop.db.deposit_history(user, 10).await.unwrap().len(), 2);
    tear_down(shop.db).await;
}
