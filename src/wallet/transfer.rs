// Coin transfers between accounts

use super::{Wallet, WalletError};
use crate::account::{format_minor, normalize_phone, AccountId};
use crate::ledger::{reference, EntryKind, LedgerEntry};
use crate::notify::{Notification, NotificationKind};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

/// A validated coin transfer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub recipient_phone: String,
    /// Minor units
    pub amount: u64,
    pub note: Option<String>,
}

impl TransferRequest {
    pub fn new(recipient_phone: &str, amount: u64) -> Self {
        Self {
            recipient_phone: recipient_phone.to_string(),
            amount,
            note: None,
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

/// Result of a completed transfer
#[derive(Clone, Debug, Serialize)]
pub struct TransferReceipt {
    pub reference: String,
    pub amount: u64,
    pub sender_entry: LedgerEntry,
    pub recipient_entry: LedgerEntry,
    pub sender_balance: u64,
    pub recipient_balance: u64,
}

impl Wallet {
    /// Move coins from `sender_id` to the account registered to the
    /// recipient phone.
    ///
    /// Balance check, debit, credit and both ledger entries commit in one
    /// transaction; a failed transfer changes nothing. Both parties are
    /// notified afterwards, and a failed notification does not undo anything.
    pub async fn transfer_coins(
        &self,
        sender_id: &AccountId,
        request: TransferRequest,
    ) -> Result<TransferReceipt, WalletError> {
        if request.amount == 0 {
            return Err(WalletError::InvalidInput("Amount must be positive".to_string()));
        }
        let phone = normalize_phone(&request.recipient_phone);
        if phone.is_empty() {
            return Err(WalletError::InvalidInput("Recipient phone number is required".to_string()));
        }

        let sender = self.require_account(sender_id)?;
        let recipient_id = self
            .store
            .account_id_by_phone(&phone)?
            .ok_or_else(|| WalletError::RecipientNotFound(phone.clone()))?;
        let recipient = self.require_account(&recipient_id)?;

        let now = Utc::now();
        let reference = reference::transfer_reference(now);
        let amount = request.amount;

        let mut out_entry = LedgerEntry::debit(
            *sender.id(),
            EntryKind::CoinTransferOut,
            amount,
            &format!("Sent {} coins to {}", format_minor(amount), recipient.name()),
        )?
        .with_reference(&reference)
        .with_metadata("counterparty_id", &recipient.id().to_hex())
        .with_metadata("counterparty_name", recipient.name())
        .with_created_at(now);

        let mut in_entry = LedgerEntry::credit(
            *recipient.id(),
            EntryKind::CoinTransferIn,
            amount,
            &format!("Received {} coins from {}", format_minor(amount), sender.name()),
        )?
        .with_reference(&reference)
        .with_metadata("counterparty_id", &sender.id().to_hex())
        .with_metadata("counterparty_name", sender.name())
        .with_created_at(now);

        if let Some(note) = request.note.as_deref().filter(|n| !n.trim().is_empty()) {
            out_entry = out_entry.with_metadata("note", note);
            in_entry = in_entry.with_metadata("note", note);
        }

        let (sender, recipient) = self
            .store
            .transfer_coins(sender.id(), recipient.id(), amount, &out_entry, &in_entry)?;

        info!(
            reference = %reference,
            from = %sender.id(),
            to = %recipient.id(),
            amount = %format_minor(amount),
            "coin transfer completed"
        );

        let sent = Notification::new(
            NotificationKind::Transfer,
            "Coins Sent",
            &format!("You sent {} coins to {}", format_minor(amount), recipient.name()),
        )
        .with_data("reference", &reference);
        let received = Notification::new(
            NotificationKind::Transfer,
            "Coins Received",
            &format!("You received {} coins from {}", format_minor(amount), sender.name()),
        )
        .with_data("reference", &reference);

        self.notify(&sender, sent).await;
        self.notify(&recipient, received).await;

        Ok(TransferReceipt {
            reference,
            amount,
            sender_balance: sender.coin_balance(),
            recipient_balance: recipient.coin_balance(),
            sender_entry: out_entry,
            recipient_entry: in_entry,
        })
    }
}
