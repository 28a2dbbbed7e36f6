use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::economy::EconomyError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub language_code: Option<String>,
    pub energy: u32,
    pub golden_cards: Vec<GoldenCard>,
    pub referred_users: BTreeSet<i64>,
    pub referred_by: Option<i64>,
    pub is_admin: bool,
    pub registered_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            username: None,
            full_name: None,
            language_code: None,
            energy: 0,
            golden_cards: Vec::new(),
            referred_users: BTreeSet::new(),
            referred_by: None,
            is_admin: false,
            registered_at: None,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered_at.is_some()
    }

    pub fn add_energy(&mut self, amount: u32) {
        self.energy = self.energy.saturating_add(amount);
    }

    pub fn spend_energy(&mut self, amount: u32) -> Result<(), EconomyError> {
        if amount == 0 {
            return Err(EconomyError::InvalidAmount(
                "energy spend must be positive".to_string(),
            ));
        }
        if self.energy < amount {
            return Err(EconomyError::InsufficientEnergy {
                user_id: self.user_id,
                required: amount,
                available: self.energy,
            });
        }
        self.energy -= amount;
        Ok(())
    }

    pub fn add_golden_card(&mut self, card: GoldenCard) {
        self.golden_cards.push(card);
    }

    /// removes and returns the oldest card that has not expired yet
    pub fn pop_active_golden_card(&mut self, now: DateTime<Utc>) -> Option<GoldenCard> {
        let index = self
            .golden_cards
            .iter()
            .position(|card| card.is_active(now))?;
        Some(self.golden_cards.remove(index))
    }

    pub fn active_golden_cards(&self, now: DateTime<Utc>) -> usize {
        self.golden_cards
            .iter()
            .filter(|card| card.is_active(now))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenCard {
    pub duration_secs: i64,
    pub purchased_at: DateTime<Utc>,
}

impl GoldenCard {
    pub fn new(duration: Duration, purchased_at: DateTime<Utc>) -> Self {
        Self {
            duration_secs: duration.num_seconds(),
            purchased_at,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::try_seconds(self.duration_secs).unwrap_or(Duration::MAX)
    }

    /// none when the expiry is past the last representable timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.purchased_at.checked_add_signed(self.duration())
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map_or(true, |expires_at| expires_at > now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostStatus {
    Pending,
    Approved,
    Rejected,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// assigned by storage on insert
    pub post_id: u64,
    pub user_id: i64,
    pub text: String,
    pub requires_pin: bool,
    pub status: PostStatus,
    pub energy_spent: u32,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(user_id: i64, text: String, requires_pin: bool, energy_spent: u32) -> Self {
        Self {
            post_id: 0,
            user_id,
            text,
            requires_pin,
            status: PostStatus::Pending,
            energy_spent,
            created_at: Utc::now(),
            published_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvoiceKind {
    Energy { amount: u32 },
    GoldenCard { hours: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Active,
    Paid,
    Expired,
}

impl InvoiceStatus {
    /// maps Crypto Pay status strings; unknown values stay active
    pub fn from_api(status: &str) -> Self {
        match status {
            "paid" => InvoiceStatus::Paid,
            "expired" => InvoiceStatus::Expired,
            _ => InvoiceStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: i64,
    pub user_id: i64,
    pub kind: InvoiceKind,
    /// amount charged in `asset`
    pub amount: f64,
    pub asset: String,
    pub pay_url: String,
    /// price in rubles
    pub price: f64,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BotSettings {
    pub autopost_paused: bool,
    pub post_energy_cost: u32,
    pub energy_price_per_unit: f64,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            autopost_paused: false,
            post_energy_cost: crate::config::POST_ENERGY_COST,
            energy_price_per_unit: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketAuthor {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub author: TicketAuthor,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub ticket_id: u64,
    pub user_id: i64,
    pub status: TicketStatus,
    pub messages: Vec<TicketMessage>,
    pub created_at: DateTime<Utc>,
}
