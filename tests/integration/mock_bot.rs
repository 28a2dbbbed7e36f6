use channel_admin::bot::SharedEconomy;
use channel_admin::economy::{EconomyError, ReferralReward};
use channel_admin::handlers::PaymentHandler;
use channel_admin::localization::Lang;
use channel_admin::models::{Invoice, InvoiceKind, Post, User};
use channel_admin::payments::CryptoPayInvoice;
use channel_admin::utils::MessageFormatter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// represents a sent message for verification in tests
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
}

/// mock telegram bot that replays handler flows against the ledger without API calls
#[derive(Debug, Clone, Default)]
pub struct MockTelegramBot {
    pub sent_messages: Arc<Mutex<Vec<SentMessage>>>,
    pub user_interactions: Arc<Mutex<HashMap<i64, Vec<String>>>>,
    pub lang: Lang,
}

impl MockTelegramBot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send_message(&self, chat_id: i64, text: String) {
        self.sent_messages.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.clone(),
        });
        self.user_interactions
            .lock()
            .unwrap()
            .entry(chat_id)
            .or_default()
            .push(text);
    }

    pub fn get_sent_messages(&self) -> Vec<SentMessage> {
        self.sent_messages.lock().unwrap().clone()
    }

    pub fn get_messages_for_chat(&self, chat_id: i64) -> Vec<SentMessage> {
        self.sent_messages
            .lock()
            .unwrap()
            .iter()
            .filter(|msg| msg.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub fn clear_messages(&self) {
        self.sent_messages.lock().unwrap().clear();
        self.user_interactions.lock().unwrap().clear();
    }

    pub fn message_count_for_chat(&self, chat_id: i64) -> usize {
        self.get_messages_for_chat(chat_id).len()
    }

    pub fn chat_received_message_containing(&self, chat_id: i64, text: &str) -> bool {
        self.get_messages_for_chat(chat_id)
            .iter()
            .any(|msg| msg.text.contains(text))
    }

    /// `/start <payload>` the way the command handler runs it
    pub async fn simulate_user_start(
        &self,
        economy: &SharedEconomy,
        user_id: i64,
        username: Option<&str>,
        full_name: Option<&str>,
        start_payload: &str,
        subscribed: bool,
    ) -> Result<(User, Option<ReferralReward>), EconomyError> {
        let outcome = {
            let mut economy = economy.lock().await;
            economy
                .register_user(user_id, subscribed, username, full_name)
                .map(|(user, is_new)| {
                    let reward = MessageFormatter::parse_start_payload(start_payload)
                        .filter(|referrer_id| *referrer_id != user_id && is_new)
                        .filter(|referrer_id| economy.validate_referrer(*referrer_id))
                        .and_then(|referrer_id| economy.award_referral(referrer_id, user_id).ok())
                        .flatten();
                    (user, is_new, reward)
                })
        };

        let (user, is_new, reward) = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.send_message(user_id, self.lang.economy_error(&e));
                return Err(e);
            }
        };

        if let Some(reward) = &reward {
            self.send_message(
                reward.referrer_id,
                self.lang.referral_reward(
                    reward.energy_awarded,
                    reward.referral_count,
                    reward.is_celebration_milestone,
                ),
            );
        }

        let welcome = if is_new {
            self.lang.welcome_registered(user.energy)
        } else {
            self.lang.welcome_back(user.energy)
        };
        self.send_message(user_id, welcome);
        Ok((user, reward))
    }

    /// `/post <text>` with auto-approval when no admins are configured
    pub async fn simulate_post(
        &self,
        economy: &SharedEconomy,
        user_id: i64,
        text: &str,
    ) -> Result<Post, EconomyError> {
        let result = {
            let mut economy = economy.lock().await;
            economy.submit_post(user_id, text).and_then(|post| {
                if economy.admin_ids().is_empty() {
                    economy.approve_post(post.post_id)
                } else {
                    Ok(post)
                }
            })
        };

        match &result {
            Ok(post) => {
                self.send_message(user_id, self.lang.post_accepted(post.post_id, post.requires_pin));
                let admins = { economy.lock().await.admin_ids() };
                for admin_id in admins {
                    self.send_message(
                        admin_id,
                        self.lang.moderation_request(
                            post.post_id,
                            user_id,
                            post.requires_pin,
                            &MessageFormatter::escape_html(&post.text),
                        ),
                    );
                }
            }
            Err(e) => self.send_message(user_id, self.lang.economy_error(e)),
        }
        result
    }

    /// one publisher tick: takes the next approved post and marks it published
    pub async fn simulate_publish_tick(&self, economy: &SharedEconomy, channel_id: i64) -> Option<Post> {
        let post = { economy.lock().await.next_post_to_publish()? };
        self.send_message(channel_id, post.text.clone());
        economy
            .lock()
            .await
            .mark_post_published(post.post_id, chrono::Utc::now())
            .ok()
    }

    /// records an invoice as if the gateway had just created it
    pub async fn simulate_invoice_created(
        &self,
        economy: &SharedEconomy,
        invoice_id: i64,
        user_id: i64,
        kind: InvoiceKind,
    ) -> Invoice {
        let invoice = Invoice {
            invoice_id,
            user_id,
            kind,
            amount: 1.0,
            asset: "USDT".to_string(),
            pay_url: format!("https://t.me/CryptoBot?start=IV{}", invoice_id),
            price: 100.0,
            status: channel_admin::models::InvoiceStatus::Active,
            created_at: chrono::Utc::now(),
            paid_at: None,
        };
        economy.lock().await.record_invoice(invoice.clone());
        self.send_message(
            user_id,
            self.lang
                .invoice_ready(invoice.price, invoice.amount, &invoice.asset, &invoice.pay_url),
        );
        invoice
    }

    /// one poller pass for a single invoice with the given gateway status
    pub async fn simulate_gateway_status(
        &self,
        payments: &PaymentHandler,
        economy: &SharedEconomy,
        invoice_id: i64,
        status: &str,
    ) -> Result<Option<Invoice>, EconomyError> {
        let remote = CryptoPayInvoice {
            invoice_id,
            pay_url: String::new(),
            amount: 1.0,
            asset: "USDT".to_string(),
            status: status.to_string(),
            description: None,
            payload: None,
        };
        let credited = payments.apply_remote_status(invoice_id, &remote).await?;

        if let Some(invoice) = &credited {
            let balance = {
                economy
                    .lock()
                    .await
                    .get_user_balance(invoice.user_id)
                    .map(|user| user.energy)
                    .unwrap_or(0)
            };
            let text = match invoice.kind {
                InvoiceKind::Energy { amount } => self.lang.invoice_paid_energy(amount, balance),
                InvoiceKind::GoldenCard { hours } => self.lang.invoice_paid_golden(hours),
            };
            self.send_message(invoice.user_id, text);
        }
        Ok(credited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_bot_basic_functionality() {
        let bot = MockTelegramBot::new();

        bot.send_message(123, "Hello".to_string());
        bot.send_message(456, "World".to_string());

        let messages = bot.get_sent_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].chat_id, 123);
        assert_eq!(messages[1].text, "World");

        assert_eq!(bot.message_count_for_chat(123), 1);
        assert!(bot.chat_received_message_containing(123, "Hello"));
        assert!(!bot.chat_received_message_containing(123, "World"));

        bot.clear_messages();
        assert!(bot.get_sent_messages().is_empty());
    }
}
