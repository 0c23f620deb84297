// Config module - Wallet tunables
// Withdrawal threshold, referral bonus, collaborator timeouts and OTP lifetime

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from configuration validation
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the wallet service
///
/// All money values are in minor units (hundredths).
#[derive(Clone, Debug)]
pub struct WalletConfig {
    /// Directory holding the sled database
    pub data_dir: PathBuf,
    /// Smallest withdrawal accepted
    pub min_withdrawal: u64,
    /// Cash credited to a referrer once per referred account
    pub referral_bonus: u64,
    /// Upper bound on a single notification send
    pub notify_timeout_ms: u64,
    /// Upper bound on a single payout provider call
    pub payout_timeout_secs: u64,
    /// Provider calls made before a withdrawal is left pending
    pub payout_max_attempts: u32,
    /// Delay between provider calls
    pub payout_retry_delay_ms: u64,
    /// Lifetime of a one-time code
    pub otp_ttl_secs: u64,
    /// Default history page size
    pub history_page_size: usize,
}

impl WalletConfig {
    /// Create a new config with builder pattern
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_min_withdrawal(mut self, amount: u64) -> Self {
        self.min_withdrawal = amount;
        self
    }

    pub fn with_referral_bonus(mut self, amount: u64) -> Self {
        self.referral_bonus = amount;
        self
    }

    pub fn with_notify_timeout_ms(mut self, ms: u64) -> Self {
        self.notify_timeout_ms = ms;
        self
    }

    pub fn with_payout_timeout_secs(mut self, secs: u64) -> Self {
        self.payout_timeout_secs = secs;
        self
    }

    pub fn with_payout_max_attempts(mut self, attempts: u32) -> Self {
        self.payout_max_attempts = attempts;
        self
    }

    pub fn with_payout_retry_delay_ms(mut self, ms: u64) -> Self {
        self.payout_retry_delay_ms = ms;
        self
    }

    pub fn with_otp_ttl_secs(mut self, secs: u64) -> Self {
        self.otp_ttl_secs = secs;
        self
    }

    pub fn with_history_page_size(mut self, size: usize) -> Self {
        self.history_page_size = size;
        self
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }

    pub fn payout_timeout(&self) -> Duration {
        Duration::from_secs(self.payout_timeout_secs)
    }

    pub fn payout_retry_delay(&self) -> Duration {
        Duration::from_millis(self.payout_retry_delay_ms)
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_ttl_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.referral_bonus == 0 {
            return Err(ConfigError::Invalid("referral_bonus must be > 0".to_string()));
        }
        if self.notify_timeout_ms == 0 {
            return Err(ConfigError::Invalid("notify_timeout_ms must be > 0".to_string()));
        }
        if self.payout_timeout_secs == 0 {
            return Err(ConfigError::Invalid("payout_timeout_secs must be > 0".to_string()));
        }
        if self.payout_max_attempts == 0 {
            return Err(ConfigError::Invalid("payout_max_attempts must be > 0".to_string()));
        }
        if self.otp_ttl_secs == 0 {
            return Err(ConfigError::Invalid("otp_ttl_secs must be > 0".to_string()));
        }
        if self.history_page_size == 0 {
            return Err(ConfigError::Invalid("history_page_size must be > 0".to_string()));
        }
        Ok(())
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("quizwallet-data"),
            min_withdrawal: 1_000,
            referral_bonus: 500,
            notify_timeout_ms: 5_000,
            payout_timeout_secs: 30,
            payout_max_attempts: 1,
            payout_retry_delay_ms: 0,
            otp_ttl_secs: 600, // 10 minutes
            history_page_size: 20,
        }
    }
}
