use log::{error, info, warn};
use serde_json::{json, Value};
use std::error::Error;
use std::fmt;
use url::Url;

use crate::config::{CryptoPayConfig, CRYPTOPAY_API_BASE, DEFAULT_CRYPTOPAY_ASSET, INVOICE_TTL_SECS};
use crate::models::InvoiceKind;

#[derive(Debug)]
pub enum CryptoPayError {
    InvalidAmount(f64),
    InvalidConfig(String),
    Http(reqwest::Error),
    Api(String),
    UnexpectedResponse(String),
    InvoiceNotFound(i64),
}

impl fmt::Display for CryptoPayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoPayError::InvalidAmount(amount) => {
                write!(f, "Amount must be positive, got {}", amount)
            }
            CryptoPayError::InvalidConfig(reason) => {
                write!(f, "Invalid Crypto Pay configuration: {}", reason)
            }
            CryptoPayError::Http(e) => write!(f, "Failed to contact Crypto Pay: {}", e),
            CryptoPayError::Api(message) => write!(f, "{}", message),
            CryptoPayError::UnexpectedResponse(text) => {
                write!(f, "Unexpected response from Crypto Pay: {}", text)
            }
            CryptoPayError::InvoiceNotFound(invoice_id) => {
                write!(f, "Invoice {} not found", invoice_id)
            }
        }
    }
}

impl Error for CryptoPayError {}

impl From<reqwest::Error> for CryptoPayError {
    fn from(err: reqwest::Error) -> Self {
        CryptoPayError::Http(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CryptoPayInvoice {
    pub invoice_id: i64,
    pub pay_url: String,
    pub amount: f64,
    pub asset: String,
    pub status: String,
    pub description: Option<String>,
    pub payload: Option<String>,
}

/// what an invoice buys and for whom, carried through Crypto Pay as `kind:user:value`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoicePayload {
    pub user_id: i64,
    pub kind: InvoiceKind,
}

impl InvoicePayload {
    pub fn encode(&self) -> String {
        match self.kind {
            InvoiceKind::Energy { amount } => format!("energy:{}:{}", self.user_id, amount),
            InvoiceKind::GoldenCard { hours } => format!("golden:{}:{}", self.user_id, hours),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().splitn(3, ':');
        let tag = parts.next()?;
        let user_id = parts.next()?.parse::<i64>().ok()?;
        let value = parts.next()?.parse::<u32>().ok()?;
        let kind = match tag {
            "energy" => InvoiceKind::Energy { amount: value },
            "golden" => InvoiceKind::GoldenCard { hours: value },
            _ => return None,
        };
        Some(Self { user_id, kind })
    }
}

/// minimal async client for the Crypto Pay API
#[derive(Debug, Clone)]
pub struct CryptoPayClient {
    http: reqwest::Client,
    token: String,
    default_asset: String,
    api_base: Url,
    expires_in: u64,
}

impl CryptoPayClient {
    pub fn new(token: &str, default_asset: &str, api_base: &str) -> Result<Self, CryptoPayError> {
        if token.trim().is_empty() {
            return Err(CryptoPayError::InvalidConfig("token is empty".to_string()));
        }
        let api_base = Url::parse(api_base.trim_end_matches('/'))
            .map_err(|e| CryptoPayError::InvalidConfig(format!("bad api base: {}", e)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            token: token.to_string(),
            default_asset: default_asset.to_string(),
            api_base,
            expires_in: INVOICE_TTL_SECS,
        })
    }

    pub fn from_config(config: &CryptoPayConfig) -> Result<Self, CryptoPayError> {
        Ok(Self::new(&config.token, &config.asset, &config.api_base)?
            .with_expires_in(config.invoice_ttl_secs))
    }

    /// seconds an invoice stays payable at the gateway
    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = seconds.max(1);
        self
    }

    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    pub fn with_token(token: &str) -> Result<Self, CryptoPayError> {
        Self::new(token, DEFAULT_CRYPTOPAY_ASSET, CRYPTOPAY_API_BASE)
    }

    fn endpoint(&self, method: &str) -> Result<Url, CryptoPayError> {
        let base = self.api_base.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, method))
            .map_err(|e| CryptoPayError::InvalidConfig(e.to_string()))
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value, CryptoPayError> {
        let response = self
            .http
            .post(self.endpoint(method)?)
            .header("Crypto-Pay-API-Token", &self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        parse_response(status.as_u16(), status.canonical_reason(), &text)
    }

    /// creates a payment invoice and returns its public link
    pub async fn create_invoice(
        &self,
        amount: f64,
        description: &str,
        payload: Option<&str>,
        asset: Option<&str>,
    ) -> Result<CryptoPayInvoice, CryptoPayError> {
        let body = self.invoice_body(amount, description, payload, asset)?;
        let result = self.call("createInvoice", body).await?;
        let invoice = parse_invoice(&result)?;
        info!(
            "Created Crypto Pay invoice {} for {} {}",
            invoice.invoice_id, invoice.amount, invoice.asset
        );
        Ok(invoice)
    }

    fn invoice_body(
        &self,
        amount: f64,
        description: &str,
        payload: Option<&str>,
        asset: Option<&str>,
    ) -> Result<Value, CryptoPayError> {
        let amount = round_amount(amount);
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CryptoPayError::InvalidAmount(amount));
        }

        let mut body = json!({
            "amount": format!("{:.2}", amount),
            "asset": asset.unwrap_or(self.default_asset.as_str()),
            "description": description,
        });
        if let Some(payload) = payload {
            body["payload"] = Value::String(payload.to_string());
        }
        body["expires_in"] = json!(self.expires_in);
        Ok(body)
    }

    pub async fn get_invoice(&self, invoice_id: i64) -> Result<CryptoPayInvoice, CryptoPayError> {
        let body = json!({ "invoice_ids": invoice_id.to_string() });
        let result = self.call("getInvoices", body).await?;
        select_invoice(&result, invoice_id)
    }

    /// fetches several invoices with one getInvoices call
    pub async fn get_invoices(
        &self,
        invoice_ids: &[i64],
    ) -> Result<Vec<CryptoPayInvoice>, CryptoPayError> {
        if invoice_ids.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({
            "invoice_ids": join_invoice_ids(invoice_ids),
            "count": invoice_ids.len(),
        });
        let result = self.call("getInvoices", body).await?;
        Ok(invoice_candidates(&result)
            .into_iter()
            .filter_map(|item| match parse_invoice(item) {
                Ok(invoice) => Some(invoice),
                Err(e) => {
                    warn!("Skipping malformed invoice in getInvoices result: {}", e);
                    None
                }
            })
            .collect())
    }
}

fn join_invoice_ids(invoice_ids: &[i64]) -> String {
    invoice_ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn round_amount(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// returns the most helpful error message from a Crypto Pay response
pub fn extract_error_message(payload: &Value) -> Option<String> {
    for key in ["error", "description", "message"] {
        match payload.get(key) {
            Some(Value::String(value)) if !value.trim().is_empty() => {
                return Some(value.clone());
            }
            Some(Value::Object(inner)) => {
                if let Some(Value::String(name)) = inner.get("name") {
                    if !name.trim().is_empty() {
                        return Some(name.clone());
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// validates a raw API response and returns its `result` field
pub fn parse_response(
    status: u16,
    reason: Option<&str>,
    body: &str,
) -> Result<Value, CryptoPayError> {
    let payload: Value = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(_) => {
            let text = body.trim();
            let detail = if !text.is_empty() {
                text.to_string()
            } else {
                reason
                    .map(String::from)
                    .unwrap_or_else(|| format!("HTTP {}", status))
            };
            error!("Crypto Pay returned a non-JSON response: {}", detail);
            return Err(CryptoPayError::UnexpectedResponse(detail));
        }
    };

    if status >= 400 {
        let message = extract_error_message(&payload).unwrap_or_else(|| {
            reason
                .map(String::from)
                .unwrap_or_else(|| format!("HTTP error {}", status))
        });
        return Err(CryptoPayError::Api(message));
    }

    if !payload.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        let message = extract_error_message(&payload)
            .unwrap_or_else(|| "Crypto Pay request failed".to_string());
        return Err(CryptoPayError::Api(message));
    }

    Ok(payload.get("result").cloned().unwrap_or(Value::Null))
}

fn lenient_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse_invoice(result: &Value) -> Result<CryptoPayInvoice, CryptoPayError> {
    let missing = |field: &str| {
        CryptoPayError::UnexpectedResponse(format!("invoice field {} is missing", field))
    };

    Ok(CryptoPayInvoice {
        invoice_id: lenient_i64(result.get("invoice_id")).ok_or_else(|| missing("invoice_id"))?,
        pay_url: lenient_string(result.get("pay_url"))
            .or_else(|| lenient_string(result.get("bot_invoice_url")))
            .ok_or_else(|| missing("pay_url"))?,
        amount: lenient_f64(result.get("amount")).ok_or_else(|| missing("amount"))?,
        asset: lenient_string(result.get("asset")).ok_or_else(|| missing("asset"))?,
        status: lenient_string(result.get("status")).ok_or_else(|| missing("status"))?,
        description: lenient_string(result.get("description")),
        payload: lenient_string(result.get("payload")),
    })
}

/// getInvoices may answer with a list, an `items` list, or an object keyed by id
fn invoice_candidates(result: &Value) -> Vec<&Value> {
    match result {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => map.values().collect(),
        },
        _ => Vec::new(),
    }
}

pub fn select_invoice(result: &Value, invoice_id: i64) -> Result<CryptoPayInvoice, CryptoPayError> {
    let matching = invoice_candidates(result)
        .into_iter()
        .find(|item| lenient_i64(item.get("invoice_id")) == Some(invoice_id))
        .ok_or(CryptoPayError::InvoiceNotFound(invoice_id))?;

    parse_invoice(matching)
}
