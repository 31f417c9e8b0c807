use std::{path::Path, sync::Arc};

use stars_engine::{
    db_types::{NotificationKind, ProductField, ProductId, Stars},
    flow_state::{AddProductStep, DeleteProductStep, EditProductStep, FlowState},
};
use telegram_tools::data_objects::ReplyMarkup;

use super::{
    helpers::{TestShop, ADMIN, ALICE, BOB},
    mocks::Outgoing,
};
use crate::{inbound::InboundEvent, menus, messenger::Messenger, notifications::AdminNotifier};

#[tokio::test]
async fn start_registers_the_user_and_shows_the_menu() {
    let shop = TestShop::new().await;
    shop.command(ALICE, "/start").await;
    let sent = shop.messenger.take();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Outgoing::Text { chat, text, markup: Some(ReplyMarkup::Keyboard(keyboard)) } => {
            assert_eq!(*chat, ALICE);
            assert!(text.contains("Your balance: 0⭐"));
            assert_eq!(keyboard.keyboard.len(), 2);
        },
        other => panic!("Unexpected reply {other:?}"),
    }
    shop.command(ADMIN, "/start").await;
    match &shop.messenger.take()[0] {
        Outgoing::Text { markup: Some(ReplyMarkup::Keyboard(keyboard)), .. } => {
            assert_eq!(keyboard.keyboard.len(), 3);
            assert_eq!(keyboard.keyboard[2][0].text, menus::ADMIN_LABEL);
        },
        other => panic!("Unexpected reply {other:?}"),
    }
    // Starting again does not create a second user
    shop.command(ALICE, "/start").await;
    let stats = shop.dispatcher.ledger().stats().await.unwrap();
    assert_eq!(stats.total_users, 2);
    shop.tear_down().await;
}

#[tokio::test]
async fn only_admins_grant_and_revoke() {
    let shop = TestShop::new().await;
    shop.command(ALICE, "/grant 2002 50").await;
    assert_eq!(shop.messenger.take_texts(), vec!["⛔ This action is only available to administrators."]);
    assert_eq!(shop.balance(BOB).await, 0);

    shop.command(ADMIN, "/grant 2002 100").await;
    let sent = shop.messenger.take();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].chat(), Some(ADMIN));
    assert_eq!(sent[0].text(), Some("✅ Granted 100⭐ to user 2002. New balance: 100⭐"));
    assert_eq!(sent[1].chat(), Some(BOB));
    assert_eq!(sent[1].text(), Some("🎁 You received 100⭐ as a gift! New balance: 100⭐"));
    assert_eq!(shop.balance(BOB).await, 100);

    shop.command(ADMIN, "/grant 2002 abc").await;
    assert_eq!(shop.messenger.take_texts(), vec!["❌ Please enter a positive whole number."]);
    shop.command(ADMIN, "/grant").await;
    assert_eq!(shop.messenger.take_texts(), vec!["❌ Please enter the user id."]);

    shop.command(ADMIN, "/revoke 2002 150").await;
    assert_eq!(shop.messenger.take_texts(), vec!["❌ User 2002 does not have enough stars. Current balance: 100⭐"]);
    assert_eq!(shop.balance(BOB).await, 100);
    shop.command(ADMIN, "/starsdelete 2002 100").await;
    assert_eq!(shop.messenger.take_texts(), vec!["✅ Removed 100⭐ from user 2002. New balance: 0⭐"]);
    assert_eq!(shop.balance(BOB).await, 0);
    shop.tear_down().await;
}

#[tokio::test]
async fn grants_cannot_overflow_a_balance() {
    let shop = TestShop::new().await;
    shop.command(ADMIN, &format!("/grant 2002 {}", i64::MAX)).await;
    shop.messenger.take();
    shop.command(ADMIN, "/grant 2002 1").await;
    let sent = shop.messenger.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat(), Some(ADMIN));
    assert_eq!(sent[0].text(), Some("❌ That amount is too large for the balance. Please enter a smaller amount."));
    assert_eq!(shop.balance(BOB).await, i64::MAX);
    shop.command(ADMIN, "/revoke 2002 1").await;
    assert_eq!(shop.balance(BOB).await, i64::MAX - 1);
    shop.tear_down().await;
}

#[tokio::test]
async fn adding_a_product_reprompts_on_bad_input() {
    let shop = TestShop::new().await;
    shop.button(ALICE, "add-product").await;
    assert_eq!(shop.messenger.take_visible()[0].text(), Some("⛔ This action is only available to administrators."));
    assert!(shop.dispatcher.sessions().get(ALICE).is_none());

    shop.button(ADMIN, "add-product").await;
    shop.text(ADMIN, "Pack A").await;
    shop.messenger.take();
    shop.text(ADMIN, "abc").await;
    shop.text(ADMIN, "0").await;
    assert_eq!(shop.messenger.take_texts(), vec![
        "❌ Please enter a positive whole number.",
        "❌ Please enter a positive whole number."
    ]);
    let awaiting_price = FlowState::AddProduct(AddProductStep::AwaitingPrice { name: "Pack A".into() });
    assert_eq!(shop.dispatcher.sessions().get(ADMIN), Some(awaiting_price));

    shop.text(ADMIN, "50").await;
    shop.text(ADMIN, "x").await;
    shop.text(ADMIN, "not a file").await;
    let texts = shop.messenger.take_texts();
    assert_eq!(texts.last().map(String::as_str), Some("❌ Please send the product file as a document."));
    shop.upload(ADMIN, "BQAC1", "pack.zip", b"PK-data").await;
    assert_eq!(shop.messenger.take_texts(), vec!["✅ Product \"Pack A\" added!"]);
    assert!(shop.dispatcher.sessions().get(ADMIN).is_none());

    let products = shop.dispatcher.catalog().products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price, Stars::from(50));
    assert_eq!(products[0].description, "x");
    let stored = shop.dispatcher.catalog().assets().read(&products[0].asset_ref).await.unwrap();
    assert_eq!(stored, b"PK-data");
    assert!(products[0].asset_ref.ends_with("BQAC1_pack.zip"));
    shop.tear_down().await;
}

#[tokio::test]
async fn editing_price_and_file() {
    let shop = TestShop::new().await;
    let id = shop.add_product("Pack A", 50, "h1", b"v1").await;
    let old_ref = shop.dispatcher.catalog().product(ProductId(id)).unwrap().asset_ref;

    shop.button(ADMIN, "edit-product").await;
    shop.button(ADMIN, &format!("edit:{id}")).await;
    shop.button(ADMIN, "edit-field:price").await;
    let awaiting = FlowState::EditProduct(EditProductStep::AwaitingValue {
        product: ProductId(id),
        field: ProductField::Price,
    });
    assert_eq!(shop.dispatcher.sessions().get(ADMIN), Some(awaiting.clone()));
    shop.messenger.take();
    shop.text(ADMIN, "-3").await;
    assert_eq!(shop.dispatcher.sessions().get(ADMIN), Some(awaiting));
    shop.text(ADMIN, "75").await;
    let texts = shop.messenger.take_texts();
    assert_eq!(texts.last().map(String::as_str), Some("✅ The price of \"Pack A\" has been updated."));
    let products = shop.dispatcher.catalog().products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price, Stars::from(75));
    assert!(shop.dispatcher.sessions().get(ADMIN).is_none());

    shop.button(ADMIN, &format!("edit:{id}")).await;
    shop.button(ADMIN, "edit-field:file").await;
    shop.text(ADMIN, "a file, honestly").await;
    shop.messenger.take();
    shop.upload(ADMIN, "h2", "new.zip", b"v2").await;
    assert_eq!(shop.messenger.take_texts(), vec!["✅ The file of \"Pack A\" has been replaced."]);
    let product = shop.dispatcher.catalog().product(ProductId(id)).unwrap();
    assert_ne!(product.asset_ref, old_ref);
    assert!(!Path::new(&old_ref).exists());
    assert_eq!(shop.dispatcher.catalog().assets().read(&product.asset_ref).await.unwrap(), b"v2");
    shop.tear_down().await;
}

#[tokio::test]
async fn deleting_needs_confirmation() {
    let shop = TestShop::new().await;
    let id = shop.add_product("Pack A", 50, "h1", b"v1").await;
    let asset_ref = shop.dispatcher.catalog().product(ProductId(id)).unwrap().asset_ref;

    shop.button(ADMIN, "delete-product").await;
    shop.button(ADMIN, &format!("delete:{id}")).await;
    let confirm = FlowState::DeleteProduct(DeleteProductStep::Confirm { product: ProductId(id) });
    assert_eq!(shop.dispatcher.sessions().get(ADMIN), Some(confirm));
    shop.button(ADMIN, "cancel-delete").await;
    let select = FlowState::DeleteProduct(DeleteProductStep::SelectProduct);
    assert_eq!(shop.dispatcher.sessions().get(ADMIN), Some(select));
    shop.messenger.take();

    // A confirmation button left over from before the cancel does nothing
    shop.button(ADMIN, &format!("confirm-delete:{id}")).await;
    assert_eq!(shop.messenger.take_texts(), vec!["This menu has expired. Please start again."]);
    assert_eq!(shop.dispatcher.catalog().products().len(), 1);

    shop.button(ADMIN, &format!("delete:{id}")).await;
    shop.button(ADMIN, &format!("confirm-delete:{id}")).await;
    let texts = shop.messenger.take_texts();
    assert_eq!(texts.last().map(String::as_str), Some("✅ Product \"Pack A\" deleted."));
    assert!(shop.dispatcher.catalog().products().is_empty());
    assert!(!Path::new(&asset_ref).exists());
    assert!(shop.dispatcher.sessions().get(ADMIN).is_none());
    shop.tear_down().await;
}

#[tokio::test]
async fn purchase_delivers_the_file() {
    let shop = TestShop::new().await;
    let id = shop.add_product("Pack A", 60, "BQAC1", b"PK-data").await;
    shop.command(ADMIN, "/grant 2001 100").await;
    shop.messenger.take();

    shop.button(ALICE, &format!("view:{id}")).await;
    let sent = shop.messenger.take_visible();
    assert!(matches!(&sent[0], Outgoing::Edit { message_id: 500, .. }));
    assert!(sent[0].text().unwrap().ends_with("Your balance: 100⭐"));

    shop.button(ALICE, &format!("buy:{id}")).await;
    let sent = shop.messenger.take_visible();
    assert!(sent[0].text().unwrap().contains("Remaining after purchase: 40⭐"));
    assert_eq!(shop.balance(ALICE).await, 100);

    shop.button(ALICE, &format!("confirm-buy:{id}")).await;
    let sent = shop.messenger.take_visible();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].text(), Some("✅ Purchase of Pack A for 60⭐ complete!"));
    match &sent[1] {
        Outgoing::Document { chat, file_name, contents } => {
            assert_eq!(*chat, ALICE);
            assert_eq!(file_name, "BQAC1_Pack A.zip");
            assert_eq!(contents, b"PK-data");
        },
        other => panic!("Expected the product file, got {other:?}"),
    }
    assert_eq!(shop.balance(ALICE).await, 40);
    let stats = shop.dispatcher.ledger().stats().await.unwrap();
    assert_eq!(stats.total_purchases, 1);
    let history = shop.dispatcher.ledger().purchase_history(ALICE).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].price, Stars::from(60));
    shop.tear_down().await;
}

#[tokio::test]
async fn failed_delivery_does_not_undo_the_purchase() {
    let shop = TestShop::new().await;
    let id = shop.add_product("Pack A", 60, "BQAC1", b"PK-data").await;
    shop.command(ADMIN, "/grant 2001 100").await;
    shop.messenger.take();
    shop.messenger.fail_documents();

    shop.button(ALICE, &format!("confirm-buy:{id}")).await;
    let texts = shop.messenger.take_texts();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], "✅ Purchase of Pack A for 60⭐ complete!");
    assert!(texts[1].contains("could not be sent"));
    assert!(texts[1].contains("@shop_support"));
    assert_eq!(shop.balance(ALICE).await, 40);
    assert_eq!(shop.dispatcher.ledger().profile(ALICE).await.unwrap().purchase_count, 1);
    shop.tear_down().await;
}

#[tokio::test]
async fn purchases_need_enough_stars() {
    let shop = TestShop::new().await;
    let id = shop.add_product("Pack A", 60, "BQAC1", b"PK-data").await;
    shop.command(ADMIN, "/grant 2001 20").await;
    shop.messenger.take();

    shop.button(ALICE, &format!("buy:{id}")).await;
    assert_eq!(shop.messenger.take_texts(), vec!["❌ Not enough stars. The price is 60⭐ but your balance is 20⭐."]);
    // Going straight to the confirmation is refused by the ledger
    shop.button(ALICE, &format!("confirm-buy:{id}")).await;
    assert_eq!(shop.messenger.take_texts(), vec!["❌ Not enough stars. The price is 60⭐ but your balance is 20⭐."]);
    assert_eq!(shop.balance(ALICE).await, 20);
    assert_eq!(shop.dispatcher.ledger().profile(ALICE).await.unwrap().purchase_count, 0);
    shop.tear_down().await;
}

#[tokio::test]
async fn product_deleted_mid_purchase() {
    let shop = TestShop::new().await;
    let id = shop.add_product("Pack A", 60, "BQAC1", b"PK-data").await;
    shop.command(ADMIN, "/grant 2001 100").await;
    shop.button(ALICE, &format!("buy:{id}")).await;
    shop.dispatcher.catalog().delete_product(ProductId(id)).await.unwrap();
    shop.messenger.take();

    shop.button(ALICE, &format!("confirm-buy:{id}")).await;
    let sent = shop.messenger.take_visible();
    assert_eq!(sent.len(), 1);
    let text = sent[0].text().unwrap();
    assert!(text.starts_with("❌ That product is no longer available."));
    assert!(text.ends_with("The catalog is empty. Please check back later."));
    assert_eq!(shop.balance(ALICE).await, 100);
    shop.tear_down().await;
}

#[tokio::test]
async fn deposit_flow() {
    let shop = TestShop::new().await;
    shop.button(ALICE, "deposit").await;
    assert_eq!(shop.dispatcher.sessions().get(ALICE), Some(FlowState::DepositAmount));
    assert_eq!(shop.messenger.take_texts(), vec!["⭐ How many stars would you like to deposit? (min. 10)"]);

    shop.text(ALICE, "5").await;
    shop.text(ALICE, "twenty").await;
    assert_eq!(shop.messenger.take_texts(), vec![
        "❌ The minimum amount is 10⭐. Please enter a larger amount.",
        "❌ Please enter a positive whole number."
    ]);
    assert_eq!(shop.dispatcher.sessions().get(ALICE), Some(FlowState::DepositAmount));

    shop.text(ALICE, "20").await;
    assert_eq!(shop.messenger.take(), vec![Outgoing::Invoice {
        chat: ALICE,
        payload: "stars_deposit_2001_20".into(),
        amount: 20
    }]);
    assert!(shop.dispatcher.sessions().get(ALICE).is_none());

    let precheck = InboundEvent::PreCheckout {
        user: ALICE,
        query_id: "pc1".into(),
        payload: "stars_deposit_2001_20".into(),
    };
    shop.dispatcher.dispatch(precheck).await;
    assert_eq!(shop.messenger.take(), vec![Outgoing::PreCheckout { id: "pc1".into(), ok: true }]);

    let paid = InboundEvent::PaymentConfirmed {
        user: ALICE,
        username: Some("alice".into()),
        payload: "stars_deposit_2001_20".into(),
        amount: 20,
    };
    shop.dispatcher.dispatch(paid).await;
    assert_eq!(shop.messenger.take_texts(), vec!["✅ Your balance was topped up by 20⭐!\n⭐ Current balance: 20⭐"]);
    assert_eq!(shop.balance(ALICE).await, 20);

    // The provider has already charged for a malformed payload, so it is dropped without a word
    let garbage =
        InboundEvent::PaymentConfirmed { user: ALICE, username: None, payload: "stars_deposit_x".into(), amount: 20 };
    shop.dispatcher.dispatch(garbage).await;
    assert!(shop.messenger.take().is_empty());
    assert_eq!(shop.balance(ALICE).await, 20);

    // A reported total that disagrees with the invoice still credits what was invoiced
    let short = InboundEvent::PaymentConfirmed {
        user: ALICE,
        username: None,
        payload: "stars_deposit_2001_15".into(),
        amount: 12,
    };
    shop.dispatcher.dispatch(short).await;
    assert_eq!(shop.messenger.take_texts(), vec!["✅ Your balance was topped up by 15⭐!\n⭐ Current balance: 35⭐"]);
    assert_eq!(shop.balance(ALICE).await, 35);
    let stats = shop.dispatcher.ledger().stats().await.unwrap();
    assert_eq!(stats.total_deposited, Stars::from(35));
    shop.tear_down().await;
}

#[tokio::test]
async fn menus_and_commands_abandon_flows() {
    let shop = TestShop::new().await;
    shop.button(ALICE, "deposit").await;
    shop.text(ALICE, menus::PROFILE_LABEL).await;
    assert!(shop.dispatcher.sessions().get(ALICE).is_none());
    let texts = shop.messenger.take_texts();
    assert!(texts.last().unwrap().starts_with("👤 Your profile"));

    shop.button(ADMIN, "add-product").await;
    shop.command(ADMIN, "/help").await;
    assert!(shop.dispatcher.sessions().get(ADMIN).is_none());
    let texts = shop.messenger.take_texts();
    assert!(texts.last().unwrap().contains("/grant <user id> <amount>"));

    shop.text(BOB, "hello?").await;
    assert_eq!(shop.messenger.take_texts(), vec!["Please choose an option from the menu."]);
    shop.text(BOB, menus::STATS_LABEL).await;
    assert_eq!(shop.messenger.take_texts(), vec!["⛔ This action is only available to administrators."]);
    shop.tear_down().await;
}

#[tokio::test]
async fn admins_toggle_their_notifications() {
    let shop = TestShop::new().await;
    shop.text(ADMIN, menus::NOTIFICATIONS_LABEL).await;
    match &shop.messenger.take()[0] {
        Outgoing::Text { markup: Some(ReplyMarkup::Inline(keyboard)), .. } => {
            assert_eq!(keyboard.labels()[0], "🔔 Purchase notifications enabled");
            assert_eq!(keyboard.labels()[1], "🔔 Deposit notifications enabled");
        },
        other => panic!("Unexpected reply {other:?}"),
    }
    shop.button(ADMIN, "toggle:purchases").await;
    match &shop.messenger.take_visible()[0] {
        Outgoing::Edit { markup: Some(keyboard), .. } => {
            assert_eq!(keyboard.labels()[0], "🔔 Purchase notifications disabled");
            assert_eq!(keyboard.labels()[1], "🔔 Deposit notifications enabled");
        },
        other => panic!("Unexpected reply {other:?}"),
    }
    let flags = shop.dispatcher.ledger().notification_flags(ADMIN).await.unwrap();
    assert!(!flags.is_enabled(NotificationKind::Purchases));
    assert!(flags.is_enabled(NotificationKind::Deposits));

    shop.button(ALICE, "toggle:purchases").await;
    assert_eq!(shop.messenger.take_texts(), vec!["⛔ This action is only available to administrators."]);
    shop.tear_down().await;
}

#[tokio::test]
async fn admin_notices_respect_the_flags() {
    let shop = TestShop::new().await;
    let other_admin = stars_engine::db_types::UserId(1001);
    let messenger = Arc::clone(&shop.messenger) as Arc<dyn Messenger>;
    let notifier = AdminNotifier::new(shop.db.clone(), messenger, vec![ADMIN, other_admin]);
    shop.dispatcher.ledger().toggle_notification(ADMIN, NotificationKind::Purchases).await.unwrap();

    assert_eq!(notifier.notify(NotificationKind::Purchases, "🔔 New purchase").await, 1);
    let sent = shop.messenger.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat(), Some(other_admin));
    assert_eq!(notifier.notify(NotificationKind::Deposits, "🔔 Balance top-up").await, 2);
    shop.tear_down().await;
}

#[tokio::test]
async fn stale_buttons_and_stats() {
    let shop = TestShop::new().await;
    shop.button(ALICE, "explode").await;
    let sent = shop.messenger.take();
    assert_eq!(sent[0], Outgoing::CallbackAnswer { id: "cb-explode".into() });
    assert_eq!(sent[1].text(), Some("This menu has expired. Please start again."));

    shop.button(ADMIN, "edit-field:price").await;
    assert_eq!(shop.messenger.take_texts(), vec!["This menu has expired. Please start again."]);

    shop.command(ADMIN, "/stats").await;
    let texts = shop.messenger.take_texts();
    assert!(texts[0].contains("🛍 Purchases: 0"));
    assert!(texts[0].contains("⭐ Total deposited: 0⭐"));
    shop.tear_down().await;
}
