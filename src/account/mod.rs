// Account module - Who holds the money
// Account identity, the three balances, and new-account input

mod balance;
mod id;
mod model;

pub use balance::{format_minor, format_signed_minor, BalanceError, Balances, Currency, MINOR_UNITS};
pub use id::AccountId;
pub use model::{normalize_email, normalize_phone, Account, AccountError, NewAccount, Role};
