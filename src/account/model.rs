// Account model

use super::{AccountId, BalanceError, Balances, Currency};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const REFERRAL_CODE_LEN: usize = 6;
const REFERRAL_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Errors from account input and identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Invalid account id: {0}")]
    InvalidId(String),

    #[error("Name is required")]
    MissingName,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

/// Lowercase and trim an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Strip formatting characters from a phone number, keeping a leading '+'
pub fn normalize_phone(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect()
}

/// Input for opening an account
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub referral_code: Option<String>,
    pub role: Role,
}

impl NewAccount {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            referral_code: None,
            role: Role::User,
        }
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    /// Referral code of the account that invited this one
    pub fn with_referral_code(mut self, code: &str) -> Self {
        self.referral_code = Some(code.to_string());
        self
    }

    pub fn admin(mut self) -> Self {
        self.role = Role::Admin;
        self
    }

    /// Check fields and return the normalised (name, email, phone)
    pub fn validate(&self) -> Result<(String, String, Option<String>), AccountError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AccountError::MissingName);
        }

        let email = normalize_email(&self.email);
        let valid_email = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
            None => false,
        };
        if !valid_email {
            return Err(AccountError::InvalidEmail(self.email.clone()));
        }

        let phone = match self.phone.as_deref().map(normalize_phone) {
            Some(p) if p.is_empty() => None,
            Some(p) => {
                let digits = p.strip_prefix('+').unwrap_or(&p);
                if digits.len() < 7 || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(AccountError::InvalidPhone(p));
                }
                Some(p)
            }
            None => None,
        };

        Ok((name.to_string(), email, phone))
    }
}

/// A user account with its cash, points and coin balances
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    name: String,
    email: String,
    phone: Option<String>,
    cash_balance: u64,
    points: u64,
    coin_balance: u64,
    referral_code: String,
    referred_by: Option<AccountId>,
    role: Role,
    quizzes_completed: u64,
    created_at: DateTime<Utc>,
}

impl Account {
    /// Build a fresh account with zero balances from validated input
    pub fn open(
        name: String,
        email: String,
        phone: Option<String>,
        role: Role,
        referred_by: Option<AccountId>,
    ) -> Self {
        Self {
            id: AccountId::generate(),
            name,
            email,
            phone,
            cash_balance: 0,
            points: 0,
            coin_balance: 0,
            referral_code: Self::generate_referral_code(),
            referred_by,
            role,
            quizzes_completed: 0,
            created_at: Utc::now(),
        }
    }

    /// Six uppercase alphanumerics
    pub fn generate_referral_code() -> String {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        (0..REFERRAL_CODE_LEN)
            .map(|_| REFERRAL_CODE_ALPHABET[rng.gen_range(0..REFERRAL_CODE_ALPHABET.len())] as char)
            .collect()
    }

    /// Replace the referral code (used when a generated code collides)
    pub fn with_referral_code(mut self, code: String) -> Self {
        self.referral_code = code;
        self
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn cash_balance(&self) -> u64 {
        self.cash_balance
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn coin_balance(&self) -> u64 {
        self.coin_balance
    }

    pub fn balance(&self, currency: Currency) -> u64 {
        match currency {
            Currency::Cash => self.cash_balance,
            Currency::Coin => self.coin_balance,
        }
    }

    pub fn balances(&self) -> Balances {
        Balances {
            cash: self.cash_balance,
            points: self.points,
            coins: self.coin_balance,
        }
    }

    pub fn referral_code(&self) -> &str {
        &self.referral_code
    }

    pub fn referred_by(&self) -> Option<&AccountId> {
        self.referred_by.as_ref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn quizzes_completed(&self) -> u64 {
        self.quizzes_completed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // ========================================================================
    // BALANCE MUTATION (only called inside storage transactions)
    // ========================================================================

    /// Add to a balance
    pub(crate) fn credit(&mut self, currency: Currency, amount: u64) -> Result<(), BalanceError> {
        let slot = self.slot_mut(currency);
        *slot = slot.checked_add(amount).ok_or(BalanceError::Overflow)?;
        Ok(())
    }

    /// Subtract from a balance, failing rather than going negative
    pub(crate) fn debit(&mut self, currency: Currency, amount: u64) -> Result<(), BalanceError> {
        let slot = self.slot_mut(currency);
        if *slot < amount {
            return Err(BalanceError::InsufficientFunds {
                currency,
                available: *slot,
                required: amount,
            });
        }
        *slot -= amount;
        Ok(())
    }

    pub(crate) fn add_points(&mut self, points: u64) -> Result<(), BalanceError> {
        self.points = self.points.checked_add(points).ok_or(BalanceError::Overflow)?;
        Ok(())
    }

    pub(crate) fn record_quiz(&mut self) {
        self.quizzes_completed = self.quizzes_completed.saturating_add(1);
    }

    fn slot_mut(&mut self, currency: Currency) -> &mut u64 {
        match currency {
            Currency::Cash => &mut self.cash_balance,
            Currency::Coin => &mut self.coin_balance,
        }
    }
}
