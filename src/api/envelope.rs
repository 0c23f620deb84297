// JSON response envelope: {success, message?, data?, error?}

use crate::wallet::WalletError;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    status: u16,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
            status: 200,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn from_error(err: &WalletError) -> Self {
        Self {
            success: false,
            message: Some(err.to_string()),
            data: None,
            error: Some(err.code().to_string()),
            status: err.category().status_code(),
        }
    }

    /// Build from an operation result
    pub fn from_result(result: Result<T, WalletError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::from_error(&e),
        }
    }

    /// HTTP status this envelope would be sent with
    pub fn status(&self) -> u16 {
        self.status
    }
}
