use super::{
    mock_bot::MockTelegramBot,
    test_utils::{TestAssertions, TestScenario},
    TestEconomy,
};

#[tokio::test]
async fn test_basic_referral_chain() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();

    let referrer_id = 100;
    bot.simulate_user_start(&env.economy, referrer_id, Some("referrer"), Some("Referrer User"), "", true)
        .await
        .expect("Failed to create referrer");

    for i in 1..=5 {
        let referee_id = referrer_id + i;
        let (_, reward_info) = bot
            .simulate_user_start(
                &env.economy,
                referee_id,
                Some(&format!("referee{}", i)),
                None,
                &referrer_id.to_string(),
                true,
            )
            .await
            .expect("Failed to create referee");

        let reward = reward_info.expect("every new referee is rewarded");
        assert_eq!(reward.referral_count, i as usize);
        assert_eq!(reward.energy_awarded, 50);
        assert_eq!(reward.is_celebration_milestone, i == 1 || i == 5);
    }

    TestAssertions::assert_user_referral_count(&env.economy, referrer_id, 5).await;
    // 100 for registering + 5 * 50 for referrals
    TestAssertions::assert_user_energy(&env.economy, referrer_id, 350).await;
    TestAssertions::assert_user_referred_by(&env.economy, referrer_id + 3, Some(referrer_id)).await;

    // welcome + 5 reward notices
    assert_eq!(bot.message_count_for_chat(referrer_id), 6);
    assert!(bot.chat_received_message_containing(referrer_id, "Referral Milestone"));
    assert!(bot.chat_received_message_containing(referrer_id, "Referral Reward"));
}

#[tokio::test]
async fn test_ref_prefixed_payload() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();

    bot.simulate_user_start(&env.economy, 1, None, None, "", true)
        .await
        .expect("Failed to create referrer");
    let (_, reward) = bot
        .simulate_user_start(&env.economy, 2, None, None, "ref_1", true)
        .await
        .expect("Failed to create referee");

    assert!(reward.is_some());
    TestAssertions::assert_user_referred_by(&env.economy, 2, Some(1)).await;
}

#[tokio::test]
async fn test_repeat_start_does_not_reward_again() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();

    bot.simulate_user_start(&env.economy, 1, None, None, "", true)
        .await
        .expect("Failed to create referrer");
    bot.simulate_user_start(&env.economy, 2, None, None, "1", true)
        .await
        .expect("Failed to create referee");

    let (user, reward) = bot
        .simulate_user_start(&env.economy, 2, None, None, "1", true)
        .await
        .expect("Repeated start failed");
    assert!(reward.is_none());
    assert_eq!(user.energy, 100);

    TestAssertions::assert_user_energy(&env.economy, 1, 150).await;
    assert!(bot.chat_received_message_containing(2, "Welcome back"));
}

#[tokio::test]
async fn test_milestone_celebrations() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();
    let referrer_id = 500;

    bot.simulate_user_start(&env.economy, referrer_id, None, None, "", true)
        .await
        .expect("Failed to create referrer");

    let milestones = [1, 5, 10, 20, 30];
    for i in 1..=30i64 {
        bot.clear_messages();
        let (_, reward) = bot
            .simulate_user_start(&env.economy, referrer_id + i, None, None, &referrer_id.to_string(), true)
            .await
            .expect("Failed to create referee");

        let reward = reward.expect("referral should be credited");
        let is_milestone = milestones.contains(&i);
        assert_eq!(reward.is_celebration_milestone, is_milestone, "referral #{}", i);
        assert_eq!(
            bot.chat_received_message_containing(referrer_id, "Milestone"),
            is_milestone
        );
    }

    TestAssertions::assert_user_referral_count(&env.economy, referrer_id, 30).await;
    TestAssertions::assert_user_energy(&env.economy, referrer_id, 100 + 30 * 50).await;
}

#[tokio::test]
async fn test_edge_cases() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();

    // unknown referrer: user is still registered, nobody is credited
    let (user, reward) = bot
        .simulate_user_start(&env.economy, 10, None, None, "99999", true)
        .await
        .expect("Failed to create user");
    assert!(reward.is_none());
    assert_eq!(user.referred_by, None);

    // self-referral is ignored
    let (_, reward) = bot
        .simulate_user_start(&env.economy, 11, None, None, "11", true)
        .await
        .expect("Failed to create user");
    assert!(reward.is_none());
    TestAssertions::assert_user_energy(&env.economy, 11, 100).await;

    // garbage payload
    let (_, reward) = bot
        .simulate_user_start(&env.economy, 12, None, None, "promo2024", true)
        .await
        .expect("Failed to create user");
    assert!(reward.is_none());
}

#[tokio::test]
async fn test_unsubscribed_user_is_not_registered() {
    let env = TestEconomy::create_fresh();
    let bot = MockTelegramBot::new();

    bot.simulate_user_start(&env.economy, 1, None, None, "", true)
        .await
        .expect("Failed to create referrer");
    let result = bot
        .simulate_user_start(&env.economy, 2, None, None, "1", false)
        .await;

    assert!(result.is_err());
    assert!(env.economy.lock().await.get_user_balance(2).is_none());
    TestAssertions::assert_user_referral_count(&env.economy, 1, 0).await;
    assert!(bot.chat_received_message_containing(2, "subscribe"));
}

#[tokio::test]
async fn test_scenario_consistency() {
    let env = TestEconomy::create_fresh();

    let (referrer, referrals) = TestScenario::create_referrer_with_referrals(&env.economy, 7000, 15)
        .await
        .expect("Failed to build scenario");

    assert_eq!(referrals.len(), 15);
    assert_eq!(referrer.referred_users.len(), 15);
    assert_eq!(referrer.energy, 100 + 15 * 50);
    for referral in &referrals {
        TestAssertions::assert_user_referred_by(&env.economy, referral.user_id, Some(7000)).await;
        TestAssertions::assert_user_energy(&env.economy, referral.user_id, 100).await;
    }

    let stats = env.economy.lock().await.stats();
    assert_eq!(stats.users, 16);
    assert_eq!(stats.total_energy, (100 + 15 * 50) + 15 * 100);
}
