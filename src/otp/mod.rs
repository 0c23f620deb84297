// OTP module - One-time verification codes with an explicit lifetime
// Kept in the wallet database so codes survive restarts

mod store;

pub use store::{OtpError, OtpStore, OTP_LEN};
