use channel_admin::bot::SharedEconomy;
use channel_admin::config::{EconomyConfig, FilterConfig, PricingConfig};
use channel_admin::economy::ChannelEconomyService;
use channel_admin::handlers::PaymentHandler;
use channel_admin::storage::InMemoryStorage;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod mock_bot;
pub mod moderation_tests;
pub mod payment_tests;
pub mod referral_tests;
pub mod test_utils;

/// in-memory ledger shared the same way the bot shares it
pub struct TestEconomy {
    pub economy: SharedEconomy,
}

impl TestEconomy {
    /// default amounts: 100 energy on registration, 50 per referral, 20 per post
    pub fn create_fresh() -> Self {
        Self::with_config(
            PricingConfig::default(),
            FilterConfig::default(),
            EconomyConfig::default(),
        )
    }

    pub fn with_config(pricing: PricingConfig, filter: FilterConfig, economy: EconomyConfig) -> Self {
        let service =
            ChannelEconomyService::new(Box::new(InMemoryStorage::new()), pricing, filter, economy);
        Self {
            economy: Arc::new(Mutex::new(service)),
        }
    }

    /// one banned word and a rate of 100 rubles per dollar
    pub fn with_banned_word(word: &str) -> Self {
        Self::with_config(
            PricingConfig {
                rubles_per_usd: 100.0,
                ..PricingConfig::default()
            },
            FilterConfig {
                banned_words: BTreeSet::from([word.to_string()]),
                ..FilterConfig::default()
            },
            EconomyConfig::default(),
        )
    }

    /// payment handler without a gateway client, enough for ledger-side checks
    pub fn offline_payments(&self) -> PaymentHandler {
        PaymentHandler::new(self.economy.clone(), None)
    }

    pub async fn add_admin(&self, user_id: i64) {
        self.economy.lock().await.set_admin(user_id, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_economy_setup() {
        let env = TestEconomy::create_fresh();
        let economy = env.economy.lock().await;

        let settings = economy.settings();
        assert_eq!(settings.post_energy_cost, 20);
        assert!(!settings.autopost_paused);
        assert_eq!(economy.stats().users, 0);
        assert!(economy.banned_words().contains(&"секс".to_string()));
    }
}
