use channel_admin::models::PostStatus;

use super::{
    mock_bot::MockTelegramBot,
    test_utils::{TestAssertions, TestUserBuilder},
    TestEconomy,
};

const CHANNEL_ID: i64 = -100_500;

#[tokio::test]
async fn test_post_goes_through_moderation_and_publishing() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(1).admin().create(&env.economy).await.expect("admin");
    TestUserBuilder::new(2).create(&env.economy).await.expect("author");

    let post = bot
        .simulate_post(&env.economy, 2, "Продам гараж <недорого>")
        .await
        .expect("post should be accepted");
    assert_eq!(post.status, PostStatus::Pending);
    TestAssertions::assert_user_energy(&env.economy, 2, 80).await;
    assert!(bot.chat_received_message_containing(2, "sent to moderation"));
    assert!(bot.chat_received_message_containing(1, "&lt;недорого&gt;"));

    // nothing is published before approval
    assert!(bot.simulate_publish_tick(&env.economy, CHANNEL_ID).await.is_none());

    env.economy.lock().await.approve_post(post.post_id).expect("approve");
    let published = bot
        .simulate_publish_tick(&env.economy, CHANNEL_ID)
        .await
        .expect("approved post is published");
    assert_eq!(published.post_id, post.post_id);
    assert!(published.published_at.is_some());
    assert!(bot.chat_received_message_containing(CHANNEL_ID, "Продам гараж"));
    TestAssertions::assert_post_status(&env.economy, post.post_id, PostStatus::Published).await;
}

#[tokio::test]
async fn test_posts_auto_approved_without_admins() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(2).create(&env.economy).await.expect("author");

    let post = bot
        .simulate_post(&env.economy, 2, "hello channel")
        .await
        .expect("post should be accepted");
    assert_eq!(post.status, PostStatus::Approved);

    let published = bot.simulate_publish_tick(&env.economy, CHANNEL_ID).await;
    assert_eq!(published.map(|post| post.post_id), Some(post.post_id));
}

#[tokio::test]
async fn test_rejected_post_refunds_energy() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(1).admin().create(&env.economy).await.expect("admin");
    TestUserBuilder::new(2).create(&env.economy).await.expect("author");

    let post = bot.simulate_post(&env.economy, 2, "spam? no").await.expect("post");
    TestAssertions::assert_user_energy(&env.economy, 2, 80).await;

    let rejected = env.economy.lock().await.reject_post(post.post_id).expect("reject");
    assert_eq!(rejected.energy_spent, 20);
    TestAssertions::assert_user_energy(&env.economy, 2, 100).await;
    TestAssertions::assert_post_status(&env.economy, post.post_id, PostStatus::Rejected).await;

    // a second decision on the same post is refused
    assert!(env.economy.lock().await.approve_post(post.post_id).is_err());
    assert!(bot.simulate_publish_tick(&env.economy, CHANNEL_ID).await.is_none());
}

#[tokio::test]
async fn test_banned_words_block_post_without_charge() {
    let env = TestEconomy::with_banned_word("казино");
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(2).create(&env.economy).await.expect("author");

    let result = bot
        .simulate_post(&env.economy, 2, "Лучшее Казино, заходите!")
        .await;
    assert!(result.is_err());
    TestAssertions::assert_user_energy(&env.economy, 2, 100).await;
    assert!(bot.chat_received_message_containing(2, "banned words"));

    // admin adds a word at runtime
    env.economy.lock().await.add_banned_word("лотерея");
    assert!(bot.simulate_post(&env.economy, 2, "Лотерея сегодня").await.is_err());

    env.economy.lock().await.remove_banned_word("лотерея");
    assert!(bot.simulate_post(&env.economy, 2, "Лотерея сегодня").await.is_ok());
}

#[tokio::test]
async fn test_golden_card_pins_next_post_only() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(2).energy(200).create(&env.economy).await.expect("author");

    let spent = env
        .economy
        .lock()
        .await
        .purchase_golden_card_with_energy(2, chrono::Duration::hours(24))
        .expect("exchange energy for a golden card");
    // 24h * 1.5 rub at 1 rub per energy unit
    assert_eq!(spent, 36);

    let pinned = bot.simulate_post(&env.economy, 2, "pinned one").await.expect("post");
    let plain = bot.simulate_post(&env.economy, 2, "plain one").await.expect("post");
    assert!(pinned.requires_pin);
    assert!(!plain.requires_pin);
    assert!(bot.chat_received_message_containing(2, "will be pinned"));
    TestAssertions::assert_user_energy(&env.economy, 2, 300 - 36 - 40).await;
}

#[tokio::test]
async fn test_pause_holds_publishing_queue() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(2).create(&env.economy).await.expect("author");

    bot.simulate_post(&env.economy, 2, "first").await.expect("post");
    bot.simulate_post(&env.economy, 2, "second").await.expect("post");

    env.economy.lock().await.set_autopost_paused(true);
    assert!(bot.simulate_publish_tick(&env.economy, CHANNEL_ID).await.is_none());

    env.economy.lock().await.set_autopost_paused(false);
    let first = bot.simulate_publish_tick(&env.economy, CHANNEL_ID).await.expect("first");
    let second = bot.simulate_publish_tick(&env.economy, CHANNEL_ID).await.expect("second");
    assert_eq!(first.text, "first");
    assert_eq!(second.text, "second");
    assert!(bot.simulate_publish_tick(&env.economy, CHANNEL_ID).await.is_none());
}

#[tokio::test]
async fn test_post_price_change_applies_to_next_post() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();
    TestUserBuilder::new(2).create(&env.economy).await.expect("author");

    env.economy.lock().await.update_post_price(60);
    bot.simulate_post(&env.economy, 2, "one").await.expect("post");
    TestAssertions::assert_user_energy(&env.economy, 2, 40).await;

    let result = bot.simulate_post(&env.economy, 2, "two").await;
    assert!(result.is_err());
    assert!(bot.chat_received_message_containing(2, "Not enough energy"));
    TestAssertions::assert_user_energy(&env.economy, 2, 40).await;
}
