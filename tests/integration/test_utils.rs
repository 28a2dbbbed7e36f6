use channel_admin::bot::SharedEconomy;
use channel_admin::economy::EconomyError;
use channel_admin::models::{PostStatus, TicketStatus, User};

/// helper struct for registering test users with predictable IDs
pub struct TestUserBuilder {
    user_id: i64,
    username: Option<String>,
    full_name: Option<String>,
    extra_energy: u32,
    admin: bool,
}

impl TestUserBuilder {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            username: None,
            full_name: None,
            extra_energy: 0,
            admin: false,
        }
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn full_name(mut self, full_name: &str) -> Self {
        self.full_name = Some(full_name.to_string());
        self
    }

    /// energy granted on top of the registration bonus
    pub fn energy(mut self, amount: u32) -> Self {
        self.extra_energy = amount;
        self
    }

    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub async fn create(&self, economy: &SharedEconomy) -> Result<User, EconomyError> {
        let mut economy = economy.lock().await;
        economy.register_user(
            self.user_id,
            true,
            self.username.as_deref(),
            self.full_name.as_deref(),
        )?;
        if self.extra_energy > 0 {
            economy.grant_energy(self.user_id, self.extra_energy)?;
        }
        if self.admin {
            economy.set_admin(self.user_id, true);
        }
        economy
            .get_user_balance(self.user_id)
            .ok_or(EconomyError::UserNotFound(self.user_id))
    }
}

/// utility functions for test assertions
pub struct TestAssertions;

impl TestAssertions {
    pub async fn assert_user_energy(economy: &SharedEconomy, user_id: i64, expected: u32) {
        let actual = economy
            .lock()
            .await
            .get_user_balance(user_id)
            .map(|user| user.energy);
        assert_eq!(
            actual,
            Some(expected),
            "Expected user {} to have {} energy, but found {:?}",
            user_id,
            expected,
            actual
        );
    }

    pub async fn assert_user_referral_count(economy: &SharedEconomy, user_id: i64, expected: usize) {
        let actual = economy
            .lock()
            .await
            .get_user_balance(user_id)
            .map(|user| user.referred_users.len())
            .unwrap_or(0);
        assert_eq!(
            actual, expected,
            "Expected user {} to have {} referrals, but found {}",
            user_id, expected, actual
        );
    }

    pub async fn assert_user_referred_by(
        economy: &SharedEconomy,
        user_id: i64,
        expected_referrer_id: Option<i64>,
    ) {
        let actual = economy
            .lock()
            .await
            .get_user_balance(user_id)
            .and_then(|user| user.referred_by);
        assert_eq!(
            actual, expected_referrer_id,
            "Expected user {} to be referred by {:?}, but found {:?}",
            user_id, expected_referrer_id, actual
        );
    }

    pub async fn assert_post_status(economy: &SharedEconomy, post_id: u64, expected: PostStatus) {
        let actual = economy.lock().await.get_post(post_id).map(|post| post.status);
        assert_eq!(
            actual,
            Some(expected),
            "Expected post {} to be {:?}, but found {:?}",
            post_id,
            expected,
            actual
        );
    }

    pub async fn assert_ticket_status(economy: &SharedEconomy, ticket_id: u64, expected: TicketStatus) {
        let actual = economy
            .lock()
            .await
            .get_ticket(ticket_id)
            .map(|ticket| ticket.status);
        assert_eq!(
            actual,
            Some(expected),
            "Expected ticket {} to be {:?}, but found {:?}",
            ticket_id,
            expected,
            actual
        );
    }
}

/// helper for creating test scenarios
pub struct TestScenario;

impl TestScenario {
    /// registers a referrer and `num_referrals` users who joined through its link
    pub async fn create_referrer_with_referrals(
        economy: &SharedEconomy,
        referrer_id: i64,
        num_referrals: usize,
    ) -> Result<(User, Vec<User>), EconomyError> {
        TestUserBuilder::new(referrer_id)
            .username("referrer")
            .full_name("Referrer User")
            .create(economy)
            .await?;

        let mut referrals = Vec::new();
        for i in 0..num_referrals {
            let referral_id = referrer_id + 1000 + i as i64;
            let referral = TestUserBuilder::new(referral_id)
                .username(&format!("referral_{}", i))
                .create(economy)
                .await?;
            economy.lock().await.award_referral(referrer_id, referral_id)?;
            referrals.push(referral);
        }

        let referrer = economy
            .lock()
            .await
            .get_user_balance(referrer_id)
            .ok_or(EconomyError::UserNotFound(referrer_id))?;
        Ok((referrer, referrals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestEconomy;

    #[tokio::test]
    async fn test_user_builder() {
        let env = TestEconomy::create_fresh();

        let user = TestUserBuilder::new(12345)
            .username("testuser")
            .full_name("Test User")
            .energy(30)
            .create(&env.economy)
            .await
            .expect("Failed to create user");

        assert_eq!(user.user_id, 12345);
        assert_eq!(user.username, Some("testuser".to_string()));
        assert_eq!(user.full_name, Some("Test User".to_string()));
        assert!(user.is_registered());
        assert_eq!(user.energy, 130);
    }

    #[tokio::test]
    async fn test_assertions() {
        let env = TestEconomy::create_fresh();

        let user = TestUserBuilder::new(12345)
            .admin()
            .create(&env.economy)
            .await
            .expect("Failed to create user");
        assert!(user.is_admin);

        TestAssertions::assert_user_energy(&env.economy, user.user_id, 100).await;
        TestAssertions::assert_user_referral_count(&env.economy, user.user_id, 0).await;
        TestAssertions::assert_user_referred_by(&env.economy, user.user_id, None).await;
    }
}
