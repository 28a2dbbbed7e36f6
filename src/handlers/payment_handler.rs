use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::ChatId;

use crate::bot::{SharedEconomy, TelegramBot};
use crate::config::INVOICE_TTL_SECS;
use crate::economy::EconomyError;
use crate::localization::Lang;
use crate::models::{Invoice, InvoiceKind, InvoiceStatus};
use crate::payments::{CryptoPayClient, CryptoPayError, CryptoPayInvoice, InvoicePayload};

#[derive(Debug)]
pub enum PaymentError {
    Disabled,
    Economy(EconomyError),
    Gateway(CryptoPayError),
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentError::Disabled => write!(f, "Payment gateway is not configured"),
            PaymentError::Economy(e) => write!(f, "{}", e),
            PaymentError::Gateway(e) => write!(f, "{}", e),
        }
    }
}

impl Error for PaymentError {}

impl From<EconomyError> for PaymentError {
    fn from(err: EconomyError) -> Self {
        PaymentError::Economy(err)
    }
}

impl From<CryptoPayError> for PaymentError {
    fn from(err: CryptoPayError) -> Self {
        PaymentError::Gateway(err)
    }
}

/// price of a purchase in rubles and in the invoice asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub rub: f64,
    pub usd: f64,
}

/// extra time after the gateway ttl before an unpaid invoice is dropped locally
const STALE_INVOICE_GRACE_SECS: i64 = 600;

#[derive(Clone)]
pub struct PaymentHandler {
    economy: SharedEconomy,
    client: Option<CryptoPayClient>,
    invoice_ttl: chrono::Duration,
}

impl PaymentHandler {
    pub fn new(economy: SharedEconomy, client: Option<CryptoPayClient>) -> Self {
        let ttl_secs = client
            .as_ref()
            .map_or(INVOICE_TTL_SECS, CryptoPayClient::expires_in);
        Self {
            economy,
            client,
            invoice_ttl: chrono::Duration::seconds(ttl_secs as i64),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn quote(&self, kind: InvoiceKind) -> Result<PriceQuote, EconomyError> {
        let economy = self.economy.lock().await;
        let pricing = economy.pricing();
        let rub = match kind {
            InvoiceKind::Energy { amount } => pricing.price_for_energy(amount)?,
            InvoiceKind::GoldenCard { hours } => {
                pricing.price_for_golden_card(chrono::Duration::hours(hours as i64))?
            }
        };
        let usd = pricing.convert_rub_to_usd(rub)?;
        Ok(PriceQuote { rub, usd })
    }

    /// creates a Crypto Pay invoice for the purchase and records it as active
    pub async fn request_invoice(
        &self,
        user_id: i64,
        kind: InvoiceKind,
        lang: Lang,
    ) -> Result<Invoice, PaymentError> {
        let client = self.client.as_ref().ok_or(PaymentError::Disabled)?;
        let quote = self.quote(kind).await?;

        let description = match kind {
            InvoiceKind::Energy { amount } => lang.invoice_description_energy(amount),
            InvoiceKind::GoldenCard { hours } => lang.invoice_description_golden(hours),
        };
        let payload = InvoicePayload { user_id, kind }.encode();

        let remote = client
            .create_invoice(quote.usd, &description, Some(&payload), None)
            .await?;

        let invoice = Invoice {
            invoice_id: remote.invoice_id,
            user_id,
            kind,
            amount: remote.amount,
            asset: remote.asset,
            pay_url: remote.pay_url,
            price: quote.rub,
            status: InvoiceStatus::from_api(&remote.status),
            created_at: Utc::now(),
            paid_at: None,
        };
        self.economy.lock().await.record_invoice(invoice.clone());
        Ok(invoice)
    }

    /// sends the pay link for a purchase, or the reason it could not be created
    pub async fn send_invoice(
        &self,
        bot: &Bot,
        chat_id: ChatId,
        user_id: i64,
        kind: InvoiceKind,
        lang: Lang,
    ) -> ResponseResult<()> {
        match self.request_invoice(user_id, kind, lang).await {
            Ok(invoice) => {
                bot.send_message(
                    chat_id,
                    lang.invoice_ready(invoice.price, invoice.amount, &invoice.asset, &invoice.pay_url),
                )
                .await?;
            }
            Err(PaymentError::Disabled) => {
                bot.send_message(chat_id, lang.error_payments_disabled())
                    .await?;
            }
            Err(PaymentError::Economy(e)) => {
                bot.send_message(chat_id, lang.economy_error(&e)).await?;
            }
            Err(PaymentError::Gateway(e)) => {
                error!("Failed to create invoice for user {}: {}", user_id, e);
                bot.send_message(chat_id, lang.error_invoice_failed(&e.to_string()))
                    .await?;
            }
        }
        Ok(())
    }

    /// applies the gateway status of one invoice to the ledger; returns the invoice once it gets credited
    pub async fn apply_remote_status(
        &self,
        invoice_id: i64,
        remote: &CryptoPayInvoice,
    ) -> Result<Option<Invoice>, EconomyError> {
        let mut economy = self.economy.lock().await;
        if let Some(raw) = remote.payload.as_deref() {
            let local = economy
                .get_invoice(invoice_id)
                .ok_or(EconomyError::InvoiceNotFound(invoice_id))?;
            let expected = InvoicePayload {
                user_id: local.user_id,
                kind: local.kind,
            };
            if InvoicePayload::parse(raw) != Some(expected) {
                error!(
                    "Invoice {} payload {:?} does not match {}",
                    invoice_id,
                    raw,
                    expected.encode()
                );
                return Err(EconomyError::InvoiceMismatch(invoice_id));
            }
        }
        match InvoiceStatus::from_api(&remote.status) {
            InvoiceStatus::Paid => economy.apply_paid_invoice(invoice_id, Utc::now()),
            InvoiceStatus::Expired => {
                economy.expire_invoice(invoice_id)?;
                info!("Invoice {} expired", invoice_id);
                Ok(None)
            }
            InvoiceStatus::Active => Ok(None),
        }
    }

    /// expires invoices the gateway stopped accepting payment for
    pub async fn expire_stale_invoices(&self, now: DateTime<Utc>) -> Vec<Invoice> {
        let cutoff = now - self.invoice_ttl - chrono::Duration::seconds(STALE_INVOICE_GRACE_SECS);
        let expired = { self.economy.lock().await.expire_invoices_created_before(cutoff) };
        for invoice in &expired {
            info!(
                "Invoice {} of user {} expired unpaid",
                invoice.invoice_id, invoice.user_id
            );
        }
        expired
    }

    /// polls the gateway for all active invoices with one request
    pub async fn check_active_invoices(&self) -> Vec<Invoice> {
        let Some(client) = self.client.as_ref() else {
            return Vec::new();
        };
        self.expire_stale_invoices(Utc::now()).await;
        let active = { self.economy.lock().await.active_invoices() };
        if active.is_empty() {
            return Vec::new();
        }

        let ids = active.iter().map(|invoice| invoice.invoice_id).collect::<Vec<_>>();
        let remote_invoices = match client.get_invoices(&ids).await {
            Ok(remote_invoices) => remote_invoices,
            Err(e) => {
                warn!("Failed to fetch {} active invoices: {}", ids.len(), e);
                return Vec::new();
            }
        };

        let mut credited = Vec::new();
        for invoice in active {
            let Some(remote) = remote_invoices
                .iter()
                .find(|remote| remote.invoice_id == invoice.invoice_id)
            else {
                warn!("Invoice {} is missing from the gateway response", invoice.invoice_id);
                continue;
            };
            match self.apply_remote_status(invoice.invoice_id, remote).await {
                Ok(Some(paid)) => credited.push(paid),
                Ok(None) => {}
                Err(e) => error!("Failed to apply invoice {}: {}", invoice.invoice_id, e),
            }
        }
        credited
    }

    pub async fn run_invoice_poller(&self, bot: Arc<Bot>, period: Duration) {
        info!("Starting invoice poller (every {:?})", period);
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;
            for invoice in self.check_active_invoices().await {
                self.notify_paid(&bot, &invoice).await;
            }
        }
    }

    async fn notify_paid(&self, bot: &Bot, invoice: &Invoice) {
        let user = { self.economy.lock().await.get_user_balance(invoice.user_id) };
        let Some(user) = user else {
            warn!("Paid invoice {} belongs to unknown user", invoice.invoice_id);
            return;
        };
        let lang = Lang::from_code(user.language_code.as_deref());

        let text = match invoice.kind {
            InvoiceKind::Energy { amount } => lang.invoice_paid_energy(amount, user.energy),
            InvoiceKind::GoldenCard { hours } => lang.invoice_paid_golden(hours),
        };
        TelegramBot::notify(bot, ChatId(invoice.user_id), text).await;
        info!(
            "Notified user {} about paid invoice {}",
            invoice.user_id, invoice.invoice_id
        );
    }
}
