use std::{env, time::Duration};

use thiserror::Error;

use crate::checkout::FeeSchedule;

const API_KEY_VAR: &str = "DONOR_DESK_AI_API_KEY";
const MODEL_VAR: &str = "DONOR_DESK_AI_MODEL";
const ENDPOINT_VAR: &str = "DONOR_DESK_AI_ENDPOINT";
const TIMEOUT_VAR: &str = "DONOR_DESK_AI_TIMEOUT_SECS";
const FLAT_FEE_VAR: &str = "DONOR_DESK_FLAT_FEE";
const PERCENT_FEE_VAR: &str = "DONOR_DESK_PERCENT_FEE";
const PAYMENT_DELAY_VAR: &str = "DONOR_DESK_PAYMENT_DELAY_MS";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_PAYMENT_DELAY_MS: u64 = 1500;

#[derive(Clone, Debug, PartialEq)]
pub struct InsightConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub insights: InsightConfig,
    pub fees: FeeSchedule,
    pub payment_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            insights: InsightConfig::default(),
            fees: FeeSchedule::default(),
            payment_delay: Duration::from_millis(DEFAULT_PAYMENT_DELAY_MS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let timeout_secs: u64 = parse_or(text(TIMEOUT_VAR), TIMEOUT_VAR, DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::OutOfRange {
                key: TIMEOUT_VAR,
                value: "0".to_owned(),
            });
        }

        let flat: f64 = parse_or(text(FLAT_FEE_VAR), FLAT_FEE_VAR, defaults.fees.flat)?;
        if !flat.is_finite() || flat < 0.0 {
            return Err(ConfigError::OutOfRange {
                key: FLAT_FEE_VAR,
                value: flat.to_string(),
            });
        }
        let percent: f64 = parse_or(text(PERCENT_FEE_VAR), PERCENT_FEE_VAR, defaults.fees.percent)?;
        if !(0.0..1.0).contains(&percent) {
            return Err(ConfigError::OutOfRange {
                key: PERCENT_FEE_VAR,
                value: percent.to_string(),
            });
        }

        let delay_ms: u64 = parse_or(
            text(PAYMENT_DELAY_VAR),
            PAYMENT_DELAY_VAR,
            DEFAULT_PAYMENT_DELAY_MS,
        )?;

        Ok(Self {
            insights: InsightConfig {
                api_key: text(API_KEY_VAR),
                model: text(MODEL_VAR).unwrap_or(defaults.insights.model),
                endpoint: text(ENDPOINT_VAR)
                    .map(|endpoint| endpoint.trim_end_matches('/').to_owned())
                    .unwrap_or(defaults.insights.endpoint),
                timeout: Duration::from_secs(timeout_secs),
            },
            fees: FeeSchedule { flat, percent },
            payment_delay: Duration::from_millis(delay_ms),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} has an unparseable value: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{key} is out of range: {value}")]
    OutOfRange { key: &'static str, value: String },
}
