// Gateway module - Payout Bridge
// Hands withdrawals to the external payout provider

mod payout;

pub use payout::*;
