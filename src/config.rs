use chrono::Duration;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::error::Error;
use std::fmt;

use crate::economy::EconomyError;
use crate::filtering::MatchMode;

pub const DEFAULT_REGISTRATION_ENERGY: u32 = 100;
pub const DEFAULT_REFERRAL_ENERGY: u32 = 50;
pub const POST_ENERGY_COST: u32 = 20;
pub const MAX_GOLDEN_CARD_HOURS: u32 = 24 * 365;

pub const DEFAULT_CRYPTOPAY_ASSET: &str = "USDT";
pub const CRYPTOPAY_API_BASE: &str = "https://pay.crypt.bot/api";
/// how long an unpaid invoice stays payable at the gateway
pub const INVOICE_TTL_SECS: u64 = 3600;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} environment variable is required", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl Error for ConfigError {}

/// how much energy and golden cards cost, in rubles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub energy_price_per_unit: f64,
    pub energy_bundle_prices: BTreeMap<u32, f64>,
    pub golden_card_hourly_price: f64,
    pub rubles_per_usd: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            energy_price_per_unit: 1.0,
            energy_bundle_prices: BTreeMap::from([(50, 249.0), (100, 499.0), (300, 1499.0)]),
            golden_card_hourly_price: 1.5,
            rubles_per_usd: 66.4,
        }
    }
}

impl PricingConfig {
    pub fn price_for_energy(&self, amount: u32) -> Result<f64, EconomyError> {
        if amount == 0 {
            return Err(EconomyError::InvalidAmount(
                "energy amount must be positive".to_string(),
            ));
        }
        if let Some(price) = self.energy_bundle_prices.get(&amount) {
            return Ok(*price);
        }
        Ok(self.energy_price_per_unit * amount as f64)
    }

    pub fn price_for_golden_card(&self, duration: Duration) -> Result<f64, EconomyError> {
        let longest = Duration::hours(MAX_GOLDEN_CARD_HOURS as i64);
        if duration <= Duration::zero() || duration > longest {
            return Err(EconomyError::InvalidDuration);
        }
        let total_hours = duration.num_seconds() as f64 / 3600.0;
        Ok(self.golden_card_hourly_price * total_hours)
    }

    pub fn convert_rub_to_usd(&self, rub_amount: f64) -> Result<f64, EconomyError> {
        if rub_amount <= 0.0 {
            return Ok(0.0);
        }
        if self.rubles_per_usd <= 0.0 {
            return Err(EconomyError::InvalidExchangeRate);
        }
        Ok(rub_amount / self.rubles_per_usd)
    }

    pub fn convert_usd_to_rub(&self, usd_amount: f64) -> Result<f64, EconomyError> {
        if usd_amount <= 0.0 {
            return Ok(0.0);
        }
        if self.rubles_per_usd <= 0.0 {
            return Err(EconomyError::InvalidExchangeRate);
        }
        Ok(usd_amount * self.rubles_per_usd)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub banned_words: BTreeSet<String>,
    pub match_mode: MatchMode,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let banned_words = [
            "хуй", "пизда", "вагина", "порно", "цп", "дп", "дрочить", "лизать", "секс",
            "долбаеб", "хуйня",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            banned_words,
            match_mode: MatchMode::WholeWord,
        }
    }
}

/// ledger amounts granted or charged by the economy service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyConfig {
    pub registration_energy: u32,
    pub referral_energy: u32,
    pub post_energy_cost: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            registration_energy: DEFAULT_REGISTRATION_ENERGY,
            referral_energy: DEFAULT_REFERRAL_ENERGY,
            post_energy_cost: POST_ENERGY_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CryptoPayConfig {
    pub token: String,
    pub asset: String,
    pub api_base: String,
    pub invoice_ttl_secs: u64,
}

/// everything the bot binary reads from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub channel_id: Option<i64>,
    pub admin_ids: Vec<i64>,
    pub sponsor_channels: Vec<i64>,
    pub crypto_pay: Option<CryptoPayConfig>,
    pub pricing: PricingConfig,
    pub filter: FilterConfig,
    pub economy: EconomyConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// builds the config from any key lookup, which keeps parsing testable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let channel_id = match get("CHANNEL_ID") {
            Some(value) => Some(parse_value::<i64>("CHANNEL_ID", &value)?),
            None => None,
        };
        let admin_ids = parse_id_list("ADMIN_IDS", get("ADMIN_IDS"))?;
        let sponsor_channels = parse_id_list("SPONSOR_CHANNELS", get("SPONSOR_CHANNELS"))?;

        let crypto_pay = match get("CRYPTOPAY_TOKEN") {
            Some(token) => Some(CryptoPayConfig {
                token,
                asset: get("CRYPTOPAY_ASSET").unwrap_or_else(|| DEFAULT_CRYPTOPAY_ASSET.to_string()),
                api_base: get("CRYPTOPAY_API_BASE").unwrap_or_else(|| CRYPTOPAY_API_BASE.to_string()),
                invoice_ttl_secs: match get("CRYPTOPAY_INVOICE_TTL") {
                    Some(value) => match parse_value::<u64>("CRYPTOPAY_INVOICE_TTL", &value)? {
                        0 => {
                            return Err(ConfigError::Invalid {
                                key: "CRYPTOPAY_INVOICE_TTL",
                                value,
                            })
                        }
                        ttl => ttl,
                    },
                    None => INVOICE_TTL_SECS,
                },
            }),
            None => {
                warn!("CRYPTOPAY_TOKEN is not configured; payments will be disabled");
                None
            }
        };

        let mut pricing = PricingConfig::default();
        if let Some(value) = get("RUBLES_PER_USD") {
            let rate = parse_value::<f64>("RUBLES_PER_USD", &value)?;
            if rate <= 0.0 {
                return Err(ConfigError::Invalid {
                    key: "RUBLES_PER_USD",
                    value,
                });
            }
            pricing.rubles_per_usd = rate;
        }

        let mut filter = FilterConfig::default();
        if let Some(words) = get("BANNED_WORDS") {
            filter.banned_words = words
                .split(',')
                .map(|word| word.trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect();
        }
        if let Some(mode) = get("FILTER_MATCH_MODE") {
            filter.match_mode = match mode.to_lowercase().as_str() {
                "word" | "whole_word" => MatchMode::WholeWord,
                "substring" => MatchMode::Substring,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "FILTER_MATCH_MODE",
                        value: mode,
                    })
                }
            };
        }

        let mut economy = EconomyConfig::default();
        if let Some(value) = get("POST_ENERGY_COST") {
            economy.post_energy_cost = parse_value::<u32>("POST_ENERGY_COST", &value)?;
        }

        Ok(Self {
            bot_token,
            channel_id,
            admin_ids,
            sponsor_channels,
            crypto_pay,
            pricing,
            filter,
            economy,
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_id_list(key: &'static str, raw: Option<String>) -> Result<Vec<i64>, ConfigError> {
    match raw {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| parse_value::<i64>(key, part))
            .collect(),
        None => Ok(Vec::new()),
    }
}
