use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::gateway::LatencyProfile;

pub const DEFAULT_RESEND_COOLDOWN_SECS: u32 = 30;

/// Login flow configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct LoginConfig {
    pub resend_cooldown_secs: u32,
    pub latency: LatencyProfile,
    pub rng_seed: Option<u64>,
}

impl LoginConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = LatencyProfile::default();
        let min_ms = var_or("OTP_LATENCY_MIN_MS", defaults.min().as_millis() as u64)?;
        let max_ms = var_or("OTP_LATENCY_MAX_MS", defaults.max().as_millis() as u64)?;

        Ok(Self {
            resend_cooldown_secs: var_or("OTP_RESEND_COOLDOWN_SECS", DEFAULT_RESEND_COOLDOWN_SECS)?,
            latency: LatencyProfile::new(
                Duration::from_millis(min_ms),
                Duration::from_millis(max_ms),
            )
            .context("OTP_LATENCY_MIN_MS / OTP_LATENCY_MAX_MS are inconsistent")?,
            rng_seed: env::var("OTP_RNG_SEED")
                .ok()
                .map(|s| s.trim().parse::<u64>())
                .transpose()
                .context("OTP_RNG_SEED must be a valid number")?,
        })
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            resend_cooldown_secs: DEFAULT_RESEND_COOLDOWN_SECS,
            latency: LatencyProfile::default(),
            rng_seed: None,
        }
    }
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}
