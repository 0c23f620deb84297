// API module - Request bodies and the response envelope
//
// Bodies carry decimal amounts as clients send them; `validate` turns them
// into typed requests in minor units before anything reaches the wallet.

mod body;
mod envelope;

pub use body::{parse_money, AccountDetails, QuizBody, TransferBody, WithdrawBody};
pub use envelope::Envelope;
