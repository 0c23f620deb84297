// Referral module - Who invited whom, and whether the bonus went out

mod link;

pub use link::{ReferralError, ReferralLink, ReferralStats};
