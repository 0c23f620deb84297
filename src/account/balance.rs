// Balances and currencies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Minor units per whole currency unit (cents per dollar, hundredths per coin)
pub const MINOR_UNITS: u64 = 100;

/// Errors from balance arithmetic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Insufficient {currency} balance: available {available}, required {required}")]
    InsufficientFunds {
        currency: Currency,
        available: u64,
        required: u64,
    },

    #[error("Balance would overflow")]
    Overflow,
}

/// Ledger-tracked currencies. Points are a plain counter and not tracked here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Cash,
    Coin,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Cash => "cash",
            Currency::Coin => "coin",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Currency::Cash),
            "coin" | "coins" | "tbg" => Ok(Currency::Coin),
            other => Err(format!("unknown currency: {}", other)),
        }
    }
}

/// Snapshot of an account's balances
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub cash: u64,
    pub points: u64,
    pub coins: u64,
}

impl Balances {
    pub fn get(&self, currency: Currency) -> u64 {
        match currency {
            Currency::Cash => self.cash,
            Currency::Coin => self.coins,
        }
    }
}

/// Render minor units as a decimal string ("12.05")
pub fn format_minor(amount: u64) -> String {
    format!("{}.{:02}", amount / MINOR_UNITS, amount % MINOR_UNITS)
}

/// Render signed minor units as a decimal string ("-30.00")
pub fn format_signed_minor(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    format!("{}{}", sign, format_minor(amount.unsigned_abs()))
}
