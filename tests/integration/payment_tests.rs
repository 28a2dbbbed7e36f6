use chrono::{Duration, Utc};
use channel_admin::config::{
    EconomyConfig, FilterConfig, PricingConfig, INVOICE_TTL_SECS, MAX_GOLDEN_CARD_HOURS,
};
use channel_admin::economy::EconomyError;
use channel_admin::handlers::payment_handler::PaymentError;
use channel_admin::localization::Lang;
use channel_admin::models::{InvoiceKind, InvoiceStatus};
use channel_admin::payments::{CryptoPayInvoice, InvoicePayload};

use super::{
    mock_bot::MockTelegramBot,
    test_utils::{TestAssertions, TestUserBuilder},
    TestEconomy,
};

fn env_with_rate(rubles_per_usd: f64) -> TestEconomy {
    TestEconomy::with_config(
        PricingConfig {
            rubles_per_usd,
            ..PricingConfig::default()
        },
        FilterConfig::default(),
        EconomyConfig::default(),
    )
}

#[tokio::test]
async fn test_quotes_use_bundles_and_exchange_rate() {
    let env = env_with_rate(100.0);
    let payments = env.offline_payments();

    let bundle = payments
        .quote(InvoiceKind::Energy { amount: 100 })
        .await
        .expect("bundle quote");
    assert_eq!(bundle.rub, 499.0);
    assert!((bundle.usd - 4.99).abs() < 1e-9);

    let custom = payments
        .quote(InvoiceKind::Energy { amount: 70 })
        .await
        .expect("unit quote");
    assert_eq!(custom.rub, 70.0);

    let golden = payments
        .quote(InvoiceKind::GoldenCard { hours: 12 })
        .await
        .expect("golden quote");
    assert_eq!(golden.rub, 18.0);
    assert!((golden.usd - 0.18).abs() < 1e-9);

    assert!(matches!(
        payments.quote(InvoiceKind::Energy { amount: 0 }).await,
        Err(EconomyError::InvalidAmount(_))
    ));
    assert!(matches!(
        payments.quote(InvoiceKind::GoldenCard { hours: 0 }).await,
        Err(EconomyError::InvalidDuration)
    ));
}

#[tokio::test]
async fn test_invoice_requires_gateway() {
    let env = TestEconomy::create_fresh();
    let payments = env.offline_payments();
    assert!(!payments.is_enabled());

    let result = payments
        .request_invoice(1, InvoiceKind::Energy { amount: 50 }, Lang::En)
        .await;
    assert!(matches!(result, Err(PaymentError::Disabled)));
    assert!(env.economy.lock().await.active_invoices().is_empty());
    assert!(payments.check_active_invoices().await.is_empty());
}

#[tokio::test]
async fn test_paid_invoice_is_credited_once() {
    let env = TestEconomy::create_fresh();
    let payments = env.offline_payments();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(5).create(&env.economy).await.expect("buyer");

    bot.simulate_invoice_created(&env.economy, 42, 5, InvoiceKind::Energy { amount: 50 })
        .await;
    assert!(bot.chat_received_message_containing(5, "invoice is ready"));

    let pending = bot
        .simulate_gateway_status(&payments, &env.economy, 42, "active")
        .await
        .expect("active status");
    assert!(pending.is_none());
    TestAssertions::assert_user_energy(&env.economy, 5, 100).await;

    let credited = bot
        .simulate_gateway_status(&payments, &env.economy, 42, "paid")
        .await
        .expect("paid status")
        .expect("first paid status credits the invoice");
    assert_eq!(credited.status, InvoiceStatus::Paid);
    assert!(credited.paid_at.is_some());
    TestAssertions::assert_user_energy(&env.economy, 5, 150).await;
    assert!(bot.chat_received_message_containing(5, "New balance: 150"));

    let again = bot
        .simulate_gateway_status(&payments, &env.economy, 42, "paid")
        .await
        .expect("repeated paid status");
    assert!(again.is_none());
    TestAssertions::assert_user_energy(&env.economy, 5, 150).await;
    assert!(env.economy.lock().await.active_invoices().is_empty());
}

#[tokio::test]
async fn test_paid_golden_card_invoice_pins_next_post() {
    let env = TestEconomy::create_fresh();
    let payments = env.offline_payments();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(5).create(&env.economy).await.expect("buyer");

    bot.simulate_invoice_created(&env.economy, 7, 5, InvoiceKind::GoldenCard { hours: 24 })
        .await;
    bot.simulate_gateway_status(&payments, &env.economy, 7, "paid")
        .await
        .expect("paid status");

    let user = env.economy.lock().await.get_user_balance(5).expect("buyer");
    assert_eq!(user.golden_cards.len(), 1);
    assert_eq!(user.energy, 100);
    assert!(bot.chat_received_message_containing(5, "Golden card for 24h added"));

    let post = bot.simulate_post(&env.economy, 5, "pinned").await.expect("post");
    assert!(post.requires_pin);
}

#[tokio::test]
async fn test_expired_invoice_is_not_credited() {
    let env = TestEconomy::create_fresh();
    let payments = env.offline_payments();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(5).create(&env.economy).await.expect("buyer");

    bot.simulate_invoice_created(&env.economy, 9, 5, InvoiceKind::Energy { amount: 100 })
        .await;
    let result = bot
        .simulate_gateway_status(&payments, &env.economy, 9, "expired")
        .await
        .expect("expired status");
    assert!(result.is_none());

    let invoice = env.economy.lock().await.get_invoice(9).expect("invoice");
    assert_eq!(invoice.status, InvoiceStatus::Expired);
    assert!(env.economy.lock().await.active_invoices().is_empty());
    TestAssertions::assert_user_energy(&env.economy, 5, 100).await;
}

#[tokio::test]
async fn test_unknown_invoice_is_an_error() {
    let env = TestEconomy::create_fresh();
    let payments = env.offline_payments();
    let bot = MockTelegramBot::new();

    let result = bot
        .simulate_gateway_status(&payments, &env.economy, 404, "paid")
        .await;
    assert!(matches!(result, Err(EconomyError::InvoiceNotFound(404))));
}

#[tokio::test]
async fn test_stale_active_invoice_expires_locally() {
    let env = TestEconomy::create_fresh();
    let payments = env.offline_payments();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(5).create(&env.economy).await.expect("buyer");

    bot.simulate_invoice_created(&env.economy, 11, 5, InvoiceKind::Energy { amount: 50 })
        .await;
    bot.simulate_invoice_created(&env.economy, 12, 5, InvoiceKind::Energy { amount: 100 })
        .await;

    let now = Utc::now();
    assert!(payments.expire_stale_invoices(now).await.is_empty());

    let later = now + Duration::seconds(INVOICE_TTL_SECS as i64) + Duration::hours(1);
    let expired = payments.expire_stale_invoices(later).await;
    assert_eq!(expired.len(), 2);
    assert!(expired.iter().all(|invoice| invoice.status == InvoiceStatus::Expired));
    assert!(env.economy.lock().await.active_invoices().is_empty());
    TestAssertions::assert_user_energy(&env.economy, 5, 100).await;
}

#[tokio::test]
async fn test_gateway_payload_must_match_recorded_purchase() {
    let env = TestEconomy::create_fresh();
    let payments = env.offline_payments();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(5).create(&env.economy).await.expect("buyer");
    let invoice = bot
        .simulate_invoice_created(&env.economy, 21, 5, InvoiceKind::Energy { amount: 50 })
        .await;

    let mut remote = CryptoPayInvoice {
        invoice_id: 21,
        pay_url: invoice.pay_url.clone(),
        amount: invoice.amount,
        asset: invoice.asset.clone(),
        status: "paid".to_string(),
        description: None,
        payload: Some("energy:5:300".to_string()),
    };
    let result = payments.apply_remote_status(21, &remote).await;
    assert!(matches!(result, Err(EconomyError::InvoiceMismatch(21))));
    TestAssertions::assert_user_energy(&env.economy, 5, 100).await;

    remote.payload = Some(
        InvoicePayload {
            user_id: 5,
            kind: InvoiceKind::Energy { amount: 50 },
        }
        .encode(),
    );
    let credited = payments
        .apply_remote_status(21, &remote)
        .await
        .expect("matching payload");
    assert!(credited.is_some());
    TestAssertions::assert_user_energy(&env.economy, 5, 150).await;
}

#[tokio::test]
async fn test_oversized_golden_card_invoice_does_not_break_posting() {
    let env = TestEconomy::create_fresh();
    let payments = env.offline_payments();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(5).create(&env.economy).await.expect("buyer");

    assert!(matches!(
        payments
            .quote(InvoiceKind::GoldenCard { hours: MAX_GOLDEN_CARD_HOURS + 1 })
            .await,
        Err(EconomyError::InvalidDuration)
    ));

    bot.simulate_invoice_created(&env.economy, 31, 5, InvoiceKind::GoldenCard { hours: u32::MAX })
        .await;
    bot.simulate_gateway_status(&payments, &env.economy, 31, "paid")
        .await
        .expect("paid status");

    let user = env.economy.lock().await.get_user_balance(5).expect("buyer");
    assert_eq!(user.active_golden_cards(Utc::now()), 1);
    let post = bot.simulate_post(&env.economy, 5, "pinned").await.expect("post");
    assert!(post.requires_pin);
}
