//! Checkout configuration.
//!
//! An explicit struct passed into `CheckoutService` at construction,
//! never process-wide mutable state. Loads from environment variables
//! with sensible defaults.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use caixa_domain::{Currency, VatRate};
use caixa_payments::RetryPolicy;

use crate::error::{CheckoutError, CheckoutResult};

/// Checkout service configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// VAT rate per cart currency
    pub vat_rates: HashMap<Currency, VatRate>,

    /// Retry/backoff parameters for payment backend calls
    pub retry: RetryPolicy,

    /// How long a duplicate idempotency claim waits for the first
    /// caller's result before giving up
    pub claim_wait: Duration,

    /// Age past which a still-held reservation is considered stale and
    /// eligible for release by the background reaper
    pub reservation_timeout: Duration,
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `CAIXA_DEFAULT_CURRENCY` / `CAIXA_DEFAULT_VAT_RATE` into a
    /// one-entry VAT table (extend with [`with_vat_rate`]), plus
    /// `CAIXA_RETRY_BASE_MS`, `CAIXA_RETRY_MAX_ATTEMPTS`,
    /// `CAIXA_PAYMENT_CALL_TIMEOUT_MS`, `CAIXA_CLAIM_WAIT_MS`, and
    /// `CAIXA_RESERVATION_TIMEOUT_SECS`.
    ///
    /// [`with_vat_rate`]: CheckoutConfig::with_vat_rate
    ///
    /// # Errors
    /// Returns `CheckoutError::Config` for unparseable values.
    pub fn from_env() -> CheckoutResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let currency_code =
            env::var("CAIXA_DEFAULT_CURRENCY").unwrap_or_else(|_| "EUR".to_string());
        let currency = Currency::new(&currency_code)
            .map_err(|e| CheckoutError::Config(format!("Invalid CAIXA_DEFAULT_CURRENCY: {e}")))?;

        let rate = Self::load_decimal_env("CAIXA_DEFAULT_VAT_RATE", Decimal::new(20, 2))?;
        let rate = VatRate::new(rate)
            .map_err(|e| CheckoutError::Config(format!("Invalid CAIXA_DEFAULT_VAT_RATE: {e}")))?;

        let mut vat_rates = HashMap::new();
        vat_rates.insert(currency, rate);

        let retry = RetryPolicy {
            base_delay: Duration::from_millis(Self::load_u64_env("CAIXA_RETRY_BASE_MS", 200)?),
            max_attempts: Self::load_u64_env("CAIXA_RETRY_MAX_ATTEMPTS", 4)? as u32,
            call_timeout: Duration::from_millis(Self::load_u64_env(
                "CAIXA_PAYMENT_CALL_TIMEOUT_MS",
                5000,
            )?),
        };

        Ok(Self {
            vat_rates,
            retry,
            claim_wait: Duration::from_millis(Self::load_u64_env("CAIXA_CLAIM_WAIT_MS", 5000)?),
            reservation_timeout: Duration::from_secs(Self::load_u64_env(
                "CAIXA_RESERVATION_TIMEOUT_SECS",
                900,
            )?),
        })
    }

    /// Create test configuration: EUR at 20% VAT, USD at 0%, tight
    /// timings so retry paths run fast.
    pub fn test() -> Self {
        let mut vat_rates = HashMap::new();
        if let (Ok(eur), Ok(usd)) = (Currency::new("EUR"), Currency::new("USD")) {
            if let Ok(rate) = VatRate::new(Decimal::new(20, 2)) {
                vat_rates.insert(eur, rate);
            }
            if let Ok(rate) = VatRate::new(Decimal::ZERO) {
                vat_rates.insert(usd, rate);
            }
        }

        Self {
            vat_rates,
            retry: RetryPolicy {
                base_delay: Duration::from_millis(1),
                max_attempts: 4,
                call_timeout: Duration::from_secs(1),
            },
            claim_wait: Duration::from_secs(1),
            reservation_timeout: Duration::from_secs(60),
        }
    }

    /// Add or replace the VAT rate for a currency.
    pub fn with_vat_rate(mut self, currency: Currency, rate: VatRate) -> Self {
        self.vat_rates.insert(currency, rate);
        self
    }

    fn load_decimal_env(key: &str, default: Decimal) -> CheckoutResult<Decimal> {
        match env::var(key) {
            Ok(val) => Decimal::from_str(&val)
                .map_err(|_| CheckoutError::Config(format!("Invalid {key} value: {val}"))),
            Err(_) => Ok(default),
        }
    }

    fn load_u64_env(key: &str, default: u64) -> CheckoutResult<u64> {
        match env::var(key) {
            Ok(val) => val
                .parse::<u64>()
                .map_err(|_| CheckoutError::Config(format!("Invalid {key} value: {val}"))),
            Err(_) => Ok(default),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        let mut vat_rates = HashMap::new();
        if let (Ok(eur), Ok(rate)) = (Currency::new("EUR"), VatRate::new(Decimal::new(20, 2))) {
            vat_rates.insert(eur, rate);
        }

        Self {
            vat_rates,
            retry: RetryPolicy::default(),
            claim_wait: Duration::from_secs(5),
            reservation_timeout: Duration::from_secs(900),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = CheckoutConfig::default();
        let eur = Currency::new("EUR").unwrap();

        assert_eq!(config.vat_rates.get(&eur).unwrap().as_decimal(), dec!(0.20));
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.base_delay, Duration::from_millis(200));
    }

    #[test]
    fn test_test_config() {
        let config = CheckoutConfig::test();
        let usd = Currency::new("USD").unwrap();

        assert_eq!(config.vat_rates.get(&usd).unwrap().as_decimal(), Decimal::ZERO);
        assert_eq!(config.retry.base_delay, Duration::from_millis(1));
    }

    #[test]
    fn test_with_vat_rate() {
        let gbp = Currency::new("GBP").unwrap();
        let config =
            CheckoutConfig::test().with_vat_rate(gbp.clone(), VatRate::new(dec!(0.05)).unwrap());

        assert_eq!(config.vat_rates.get(&gbp).unwrap().as_decimal(), dec!(0.05));
    }
}
