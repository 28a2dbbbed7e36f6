use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt;

use crate::config::{EconomyConfig, FilterConfig, PricingConfig, MAX_GOLDEN_CARD_HOURS};
use crate::filtering::WordFilter;
use crate::models::{
    BotSettings, GoldenCard, Invoice, InvoiceKind, InvoiceStatus, Post, PostStatus,
    SupportTicket, TicketAuthor, TicketMessage, TicketStatus, User,
};
use crate::storage::Storage;

#[derive(Debug)]
pub enum EconomyError {
    NotSubscribed(i64),
    UserNotFound(i64),
    InsufficientEnergy {
        user_id: i64,
        required: u32,
        available: u32,
    },
    BannedContent(String),
    EmptyPost,
    EmptyMessage,
    InvalidAmount(String),
    InvalidDuration,
    InvalidExchangeRate,
    SelfReferral(i64),
    PostNotFound(u64),
    PostNotPending(u64),
    PostNotApproved(u64),
    InvoiceNotFound(i64),
    InvoiceMismatch(i64),
    TicketNotFound(u64),
    TicketClosed(u64),
}

impl fmt::Display for EconomyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EconomyError::NotSubscribed(user_id) => write!(
                f,
                "User {} must subscribe to sponsors before registering",
                user_id
            ),
            EconomyError::UserNotFound(user_id) => write!(f, "User {} not found", user_id),
            EconomyError::InsufficientEnergy {
                user_id,
                required,
                available,
            } => write!(
                f,
                "User {} has not enough energy: {} required, {} available",
                user_id, required, available
            ),
            EconomyError::BannedContent(word) => write!(
                f,
                "Post contains banned word {:?} and cannot be submitted",
                word
            ),
            EconomyError::EmptyPost => write!(f, "Post text must not be empty"),
            EconomyError::EmptyMessage => write!(f, "Message must not be empty"),
            EconomyError::InvalidAmount(reason) => write!(f, "Invalid amount: {}", reason),
            EconomyError::InvalidDuration => write!(
                f,
                "Golden card duration must be from 1 to {} hours",
                MAX_GOLDEN_CARD_HOURS
            ),
            EconomyError::InvalidExchangeRate => write!(f, "Exchange rate must be positive"),
            EconomyError::SelfReferral(user_id) => {
                write!(f, "User {} cannot refer themselves", user_id)
            }
            EconomyError::PostNotFound(post_id) => write!(f, "Post {} not found", post_id),
            EconomyError::PostNotPending(post_id) => {
                write!(f, "Post {} is not awaiting moderation", post_id)
            }
            EconomyError::PostNotApproved(post_id) => {
                write!(f, "Post {} is not approved for publishing", post_id)
            }
            EconomyError::InvoiceNotFound(invoice_id) => {
                write!(f, "Invoice {} not found", invoice_id)
            }
            EconomyError::InvoiceMismatch(invoice_id) => write!(
                f,
                "Gateway payload of invoice {} does not match the recorded purchase",
                invoice_id
            ),
            EconomyError::TicketNotFound(ticket_id) => write!(f, "Ticket {} not found", ticket_id),
            EconomyError::TicketClosed(ticket_id) => write!(f, "Ticket {} is closed", ticket_id),
        }
    }
}

impl Error for EconomyError {}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferralReward {
    pub referrer_id: i64,
    pub referred_id: i64,
    pub energy_awarded: u32,
    pub referrer_balance: u32,
    pub referral_count: usize,
    pub is_celebration_milestone: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerStats {
    pub users: usize,
    pub total_energy: u64,
    pub pending_posts: usize,
    pub approved_posts: usize,
    pub published_posts: usize,
    pub open_tickets: usize,
}

pub struct ChannelEconomyService {
    storage: Box<dyn Storage>,
    pricing: PricingConfig,
    economy: EconomyConfig,
    word_filter: WordFilter,
}

impl ChannelEconomyService {
    pub fn new(
        storage: Box<dyn Storage>,
        pricing: PricingConfig,
        filter_config: FilterConfig,
        economy: EconomyConfig,
    ) -> Self {
        let word_filter =
            WordFilter::from_words(&filter_config.banned_words, filter_config.match_mode);
        let mut service = Self {
            storage,
            pricing,
            economy,
            word_filter,
        };

        let mut settings = service.storage.get_settings();
        settings.post_energy_cost = service.economy.post_energy_cost;
        settings.energy_price_per_unit = service.pricing.energy_price_per_unit;
        service.storage.save_settings(settings);
        service
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    pub fn economy(&self) -> &EconomyConfig {
        &self.economy
    }

    /// checks if referral count hits a celebration milestone: 1, 5, 10, 20, 30, etc.
    fn is_celebration_milestone(referral_count: usize) -> bool {
        match referral_count {
            1 | 5 => true,
            n if n >= 10 && n % 10 == 0 => true,
            _ => false,
        }
    }

    fn get_or_create_user(&mut self, user_id: i64) -> User {
        match self.storage.get_user(user_id) {
            Some(user) => user,
            None => {
                let user = User::new(user_id);
                self.storage.save_user(user.clone());
                user
            }
        }
    }

    /// registers a user; the starting energy is granted only once
    pub fn register_user(
        &mut self,
        user_id: i64,
        subscribed_to_sponsors: bool,
        username: Option<&str>,
        full_name: Option<&str>,
    ) -> Result<(User, bool), EconomyError> {
        if !subscribed_to_sponsors {
            return Err(EconomyError::NotSubscribed(user_id));
        }

        let mut user = self.get_or_create_user(user_id);
        let is_new = !user.is_registered();
        if is_new {
            user.add_energy(self.economy.registration_energy);
            user.registered_at = Some(Utc::now());
            info!(
                "Registered user {} with {} energy",
                user_id, self.economy.registration_energy
            );
        }
        if username.is_some() {
            user.username = username.map(String::from);
        }
        if full_name.is_some() {
            user.full_name = full_name.map(String::from);
        }

        self.storage.save_user(user.clone());
        Ok((user, is_new))
    }

    pub fn set_language_code(&mut self, user_id: i64, language_code: Option<&str>) {
        if let Some(mut user) = self.storage.get_user(user_id) {
            user.language_code = language_code.map(String::from);
            self.storage.save_user(user);
        }
    }

    pub fn get_user_balance(&self, user_id: i64) -> Option<User> {
        self.storage.get_user(user_id)
    }

    /// credits energy and returns its price in rubles
    pub fn purchase_energy(&mut self, user_id: i64, amount: u32) -> Result<f64, EconomyError> {
        let price = self.pricing.price_for_energy(amount)?;
        let mut user = self.get_or_create_user(user_id);
        user.add_energy(amount);
        self.storage.save_user(user);
        info!("User {} bought {} energy for {:.2}", user_id, amount, price);
        Ok(price)
    }

    pub fn grant_energy(&mut self, user_id: i64, amount: u32) -> Result<u32, EconomyError> {
        if amount == 0 {
            return Err(EconomyError::InvalidAmount(
                "granted energy must be positive".to_string(),
            ));
        }
        let mut user = self.get_or_create_user(user_id);
        user.add_energy(amount);
        let balance = user.energy;
        self.storage.save_user(user);
        info!("Granted {} energy to user {}, new balance: {}", amount, user_id, balance);
        Ok(balance)
    }

    /// validates that a user exists and can be used as a referrer
    pub fn validate_referrer(&self, referrer_id: i64) -> bool {
        self.storage
            .get_user(referrer_id)
            .map(|user| user.is_registered())
            .unwrap_or(false)
    }

    /// credits the referral bonus once per referrer/referred pair
    pub fn award_referral(
        &mut self,
        referrer_id: i64,
        referred_id: i64,
    ) -> Result<Option<ReferralReward>, EconomyError> {
        if referrer_id == referred_id {
            return Err(EconomyError::SelfReferral(referrer_id));
        }

        let mut referrer = self.get_or_create_user(referrer_id);
        let mut referred = self.get_or_create_user(referred_id);

        if !referrer.referred_users.insert(referred_id) {
            info!(
                "Referral {} -> {} already credited",
                referrer_id, referred_id
            );
            return Ok(None);
        }

        referrer.add_energy(self.economy.referral_energy);
        if referred.referred_by.is_none() {
            referred.referred_by = Some(referrer_id);
        }

        let reward = ReferralReward {
            referrer_id,
            referred_id,
            energy_awarded: self.economy.referral_energy,
            referrer_balance: referrer.energy,
            referral_count: referrer.referred_users.len(),
            is_celebration_milestone: Self::is_celebration_milestone(
                referrer.referred_users.len(),
            ),
        };

        self.storage.save_user(referrer);
        self.storage.save_user(referred);
        info!(
            "Awarded {} referral energy to user {} (referrals: {})",
            reward.energy_awarded, referrer_id, reward.referral_count
        );
        Ok(Some(reward))
    }

    /// filters, charges and queues a post for moderation
    pub fn submit_post(&mut self, user_id: i64, text: &str) -> Result<Post, EconomyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EconomyError::EmptyPost);
        }

        let mut user = self.get_or_create_user(user_id);
        self.word_filter.assert_allowed(text)?;

        let cost = self.storage.get_settings().post_energy_cost;
        if cost > 0 {
            user.spend_energy(cost)?;
        }
        let golden_card = user.pop_active_golden_card(Utc::now());

        let mut post = Post::new(user_id, text.to_string(), golden_card.is_some(), cost);
        self.storage.save_user(user);
        post.post_id = self.storage.add_post(post.clone());

        info!(
            "User {} submitted post {} (cost: {}, pinned: {})",
            user_id, post.post_id, cost, post.requires_pin
        );
        Ok(post)
    }

    /// credits a golden card bought with money and returns its price in rubles
    pub fn purchase_golden_card(
        &mut self,
        user_id: i64,
        duration: Duration,
    ) -> Result<f64, EconomyError> {
        let price = self.pricing.price_for_golden_card(duration)?;
        let mut user = self.get_or_create_user(user_id);
        user.add_golden_card(GoldenCard::new(duration, Utc::now()));
        self.storage.save_user(user);
        info!(
            "User {} bought a {}h golden card for {:.2}",
            user_id,
            duration.num_hours(),
            price
        );
        Ok(price)
    }

    pub fn energy_cost_for_golden_card(&self, duration: Duration) -> Option<u32> {
        let unit_price = self.storage.get_settings().energy_price_per_unit;
        if unit_price <= 0.0 {
            return None;
        }
        let price = self.pricing.price_for_golden_card(duration).ok()?;
        Some((price / unit_price).ceil() as u32)
    }

    pub fn purchase_golden_card_with_energy(
        &mut self,
        user_id: i64,
        duration: Duration,
    ) -> Result<u32, EconomyError> {
        self.pricing.price_for_golden_card(duration)?;
        let cost = self
            .energy_cost_for_golden_card(duration)
            .ok_or(EconomyError::InvalidExchangeRate)?;

        let mut user = self.get_or_create_user(user_id);
        if cost > 0 {
            user.spend_energy(cost)?;
        }
        user.add_golden_card(GoldenCard::new(duration, Utc::now()));
        self.storage.save_user(user);
        info!(
            "User {} exchanged {} energy for a {}h golden card",
            user_id,
            cost,
            duration.num_hours()
        );
        Ok(cost)
    }

    pub fn settings(&self) -> BotSettings {
        self.storage.get_settings()
    }

    pub fn update_post_price(&mut self, cost: u32) {
        let mut settings = self.storage.get_settings();
        settings.post_energy_cost = cost;
        self.storage.save_settings(settings);
        info!("Post price set to {} energy", cost);
    }

    pub fn update_energy_price(&mut self, price_per_unit: f64) -> Result<(), EconomyError> {
        if !price_per_unit.is_finite() || price_per_unit <= 0.0 {
            return Err(EconomyError::InvalidAmount(
                "energy price must be positive".to_string(),
            ));
        }
        let mut settings = self.storage.get_settings();
        settings.energy_price_per_unit = price_per_unit;
        self.storage.save_settings(settings);
        self.pricing.energy_price_per_unit = price_per_unit;
        info!("Energy price set to {:.2} per unit", price_per_unit);
        Ok(())
    }

    pub fn set_autopost_paused(&mut self, paused: bool) {
        let mut settings = self.storage.get_settings();
        settings.autopost_paused = paused;
        self.storage.save_settings(settings);
        info!("Autopost paused: {}", paused);
    }

    pub fn set_admin(&mut self, user_id: i64, is_admin: bool) {
        let mut user = self.get_or_create_user(user_id);
        user.is_admin = is_admin;
        self.storage.save_user(user);
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.storage
            .get_user(user_id)
            .map(|user| user.is_admin)
            .unwrap_or(false)
    }

    pub fn admin_ids(&self) -> Vec<i64> {
        self.storage
            .list_users()
            .into_iter()
            .filter(|user| user.is_admin)
            .map(|user| user.user_id)
            .collect()
    }

    // moderation

    pub fn pending_posts(&self) -> Vec<Post> {
        self.storage
            .list_posts()
            .into_iter()
            .filter(|post| post.status == PostStatus::Pending)
            .collect()
    }

    pub fn get_post(&self, post_id: u64) -> Option<Post> {
        self.storage.get_post(post_id)
    }

    pub fn approve_post(&mut self, post_id: u64) -> Result<Post, EconomyError> {
        let mut post = self
            .storage
            .get_post(post_id)
            .ok_or(EconomyError::PostNotFound(post_id))?;
        if post.status != PostStatus::Pending {
            return Err(EconomyError::PostNotPending(post_id));
        }
        post.status = PostStatus::Approved;
        self.storage.save_post(post.clone());
        info!("Post {} approved", post_id);
        Ok(post)
    }

    /// rejects a pending post and refunds the energy spent on it
    pub fn reject_post(&mut self, post_id: u64) -> Result<Post, EconomyError> {
        let mut post = self
            .storage
            .get_post(post_id)
            .ok_or(EconomyError::PostNotFound(post_id))?;
        if post.status != PostStatus::Pending {
            return Err(EconomyError::PostNotPending(post_id));
        }
        post.status = PostStatus::Rejected;

        if post.energy_spent > 0 {
            let mut author = self.get_or_create_user(post.user_id);
            author.add_energy(post.energy_spent);
            self.storage.save_user(author);
        }
        self.storage.save_post(post.clone());
        info!(
            "Post {} rejected, refunded {} energy to user {}",
            post_id, post.energy_spent, post.user_id
        );
        Ok(post)
    }

    /// oldest approved post, or none while autopost is paused
    pub fn next_post_to_publish(&self) -> Option<Post> {
        if self.storage.get_settings().autopost_paused {
            return None;
        }
        self.storage
            .list_posts()
            .into_iter()
            .find(|post| post.status == PostStatus::Approved)
    }

    pub fn mark_post_published(
        &mut self,
        post_id: u64,
        published_at: DateTime<Utc>,
    ) -> Result<Post, EconomyError> {
        let mut post = self
            .storage
            .get_post(post_id)
            .ok_or(EconomyError::PostNotFound(post_id))?;
        if post.status != PostStatus::Approved {
            return Err(EconomyError::PostNotApproved(post_id));
        }
        post.status = PostStatus::Published;
        post.published_at = Some(published_at);
        self.storage.save_post(post.clone());
        Ok(post)
    }

    // banned words

    pub fn banned_words(&self) -> Vec<String> {
        self.word_filter.words()
    }

    pub fn add_banned_word(&mut self, word: &str) -> bool {
        self.word_filter.add_word(word)
    }

    pub fn remove_banned_word(&mut self, word: &str) -> bool {
        self.word_filter.remove_word(word)
    }

    // invoices

    pub fn record_invoice(&mut self, invoice: Invoice) {
        info!(
            "Recorded invoice {} for user {} ({:?})",
            invoice.invoice_id, invoice.user_id, invoice.kind
        );
        self.storage.save_invoice(invoice);
    }

    pub fn get_invoice(&self, invoice_id: i64) -> Option<Invoice> {
        self.storage.get_invoice(invoice_id)
    }

    pub fn active_invoices(&self) -> Vec<Invoice> {
        self.storage
            .list_invoices()
            .into_iter()
            .filter(|invoice| invoice.status == InvoiceStatus::Active)
            .collect()
    }

    /// credits a paid invoice; returns none when it was already credited
    pub fn apply_paid_invoice(
        &mut self,
        invoice_id: i64,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Invoice>, EconomyError> {
        let mut invoice = self
            .storage
            .get_invoice(invoice_id)
            .ok_or(EconomyError::InvoiceNotFound(invoice_id))?;
        if invoice.status == InvoiceStatus::Paid {
            return Ok(None);
        }
        if invoice.status == InvoiceStatus::Expired {
            warn!("Invoice {} was paid after it expired", invoice_id);
        }

        let mut user = self.get_or_create_user(invoice.user_id);
        match invoice.kind {
            InvoiceKind::Energy { amount } => user.add_energy(amount),
            InvoiceKind::GoldenCard { hours } => {
                user.add_golden_card(GoldenCard::new(Duration::hours(hours as i64), paid_at))
            }
        }
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_at = Some(paid_at);

        self.storage.save_user(user);
        self.storage.save_invoice(invoice.clone());
        info!(
            "Applied paid invoice {} for user {} ({:?})",
            invoice_id, invoice.user_id, invoice.kind
        );
        Ok(Some(invoice))
    }

    pub fn expire_invoice(&mut self, invoice_id: i64) -> Result<Invoice, EconomyError> {
        let mut invoice = self
            .storage
            .get_invoice(invoice_id)
            .ok_or(EconomyError::InvoiceNotFound(invoice_id))?;
        if invoice.status == InvoiceStatus::Active {
            invoice.status = InvoiceStatus::Expired;
            self.storage.save_invoice(invoice.clone());
        }
        Ok(invoice)
    }

    /// expires active invoices created before the cutoff
    pub fn expire_invoices_created_before(&mut self, cutoff: DateTime<Utc>) -> Vec<Invoice> {
        let mut expired = Vec::new();
        for mut invoice in self.active_invoices() {
            if invoice.created_at < cutoff {
                invoice.status = InvoiceStatus::Expired;
                self.storage.save_invoice(invoice.clone());
                expired.push(invoice);
            }
        }
        expired
    }

    // support tickets

    pub fn open_ticket(&mut self, user_id: i64, text: &str) -> Result<SupportTicket, EconomyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EconomyError::EmptyMessage);
        }
        let now = Utc::now();
        let mut ticket = SupportTicket {
            ticket_id: 0,
            user_id,
            status: TicketStatus::Open,
            messages: vec![TicketMessage {
                author: TicketAuthor::User,
                text: text.to_string(),
                created_at: now,
            }],
            created_at: now,
        };
        ticket.ticket_id = self.storage.add_ticket(ticket.clone());
        info!("User {} opened ticket {}", user_id, ticket.ticket_id);
        Ok(ticket)
    }

    pub fn add_ticket_message(
        &mut self,
        ticket_id: u64,
        author: TicketAuthor,
        text: &str,
    ) -> Result<SupportTicket, EconomyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EconomyError::EmptyMessage);
        }
        let mut ticket = self
            .storage
            .get_ticket(ticket_id)
            .ok_or(EconomyError::TicketNotFound(ticket_id))?;
        if ticket.status == TicketStatus::Closed {
            return Err(EconomyError::TicketClosed(ticket_id));
        }
        ticket.messages.push(TicketMessage {
            author,
            text: text.to_string(),
            created_at: Utc::now(),
        });
        self.storage.save_ticket(ticket.clone());
        Ok(ticket)
    }

    pub fn close_ticket(&mut self, ticket_id: u64) -> Result<SupportTicket, EconomyError> {
        self.set_ticket_status(ticket_id, TicketStatus::Closed)
    }

    pub fn reopen_ticket(&mut self, ticket_id: u64) -> Result<SupportTicket, EconomyError> {
        self.set_ticket_status(ticket_id, TicketStatus::Open)
    }

    fn set_ticket_status(
        &mut self,
        ticket_id: u64,
        status: TicketStatus,
    ) -> Result<SupportTicket, EconomyError> {
        let mut ticket = self
            .storage
            .get_ticket(ticket_id)
            .ok_or(EconomyError::TicketNotFound(ticket_id))?;
        ticket.status = status;
        self.storage.save_ticket(ticket.clone());
        info!("Ticket {} is now {:?}", ticket_id, status);
        Ok(ticket)
    }

    pub fn get_ticket(&self, ticket_id: u64) -> Option<SupportTicket> {
        self.storage.get_ticket(ticket_id)
    }

    pub fn list_user_tickets(&self, user_id: i64) -> Vec<SupportTicket> {
        self.storage
            .list_tickets()
            .into_iter()
            .filter(|ticket| ticket.user_id == user_id)
            .collect()
    }

    pub fn open_tickets(&self) -> Vec<SupportTicket> {
        self.storage
            .list_tickets()
            .into_iter()
            .filter(|ticket| ticket.status == TicketStatus::Open)
            .collect()
    }

    pub fn stats(&self) -> LedgerStats {
        let users = self.storage.list_users();
        let posts = self.storage.list_posts();
        let count_posts =
            |status: PostStatus| posts.iter().filter(|post| post.status == status).count();

        LedgerStats {
            users: users.len(),
            total_energy: users.iter().map(|user| user.energy as u64).sum(),
            pending_posts: count_posts(PostStatus::Pending),
            approved_posts: count_posts(PostStatus::Approved),
            published_posts: count_posts(PostStatus::Published),
            open_tickets: self.open_tickets().len(),
        }
    }
}
