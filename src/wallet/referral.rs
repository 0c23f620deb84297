// Referral bonus crediting

use super::{Wallet, WalletError};
use crate::account::{format_minor, AccountId};
use crate::ledger::{reference, EntryKind, LedgerEntry};
use crate::notify::{Notification, NotificationKind};
use crate::referral::ReferralLink;
use crate::storage::StoreError;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

/// What a crediting call did
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReferralOutcome {
    /// The account was not referred by anyone
    NoReferrer,
    /// The bonus for this pair went out earlier
    AlreadyPaid,
    Paid { link: ReferralLink, entry: LedgerEntry },
}

impl ReferralOutcome {
    pub fn is_paid(&self) -> bool {
        matches!(self, ReferralOutcome::Paid { .. })
    }
}

impl Wallet {
    /// Pay the referrer of `referred_id` their bonus, once per pair.
    ///
    /// Repeat calls return `AlreadyPaid` without touching balances. The paid
    /// check runs again inside the crediting transaction.
    pub async fn credit_referral_bonus(&self, referred_id: &AccountId) -> Result<ReferralOutcome, WalletError> {
        let referred = self.require_account(referred_id)?;
        let Some(referrer_id) = referred.referred_by().copied() else {
            debug!(account = %referred_id, "no referrer, skipping bonus");
            return Ok(ReferralOutcome::NoReferrer);
        };

        if let Some(link) = self.store.referral_link(&referrer_id, referred.id())? {
            if link.is_paid() {
                debug!(referrer = %referrer_id, referred = %referred_id, "referral bonus already paid");
                return Ok(ReferralOutcome::AlreadyPaid);
            }
        }

        let now = Utc::now();
        let bonus = self.config.referral_bonus;
        let template = ReferralLink::new(referrer_id, *referred.id(), bonus, now);
        let entry = LedgerEntry::credit(
            referrer_id,
            EntryKind::ReferralBonus,
            bonus,
            &format!("Referral bonus for {}", referred.name()),
        )?
        .with_reference(&reference::referral_reference(&referrer_id, referred.id()))
        .with_metadata("referred_user_id", &referred.id().to_hex())
        .with_metadata("referred_user_name", referred.name())
        .with_created_at(now);

        let (link, referrer) = match self.store.pay_referral(&template, &entry, now) {
            Ok(paid) => paid,
            Err(StoreError::AlreadyPaid) | Err(StoreError::DuplicateReference(_)) => {
                return Ok(ReferralOutcome::AlreadyPaid);
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            referrer = %referrer.id(),
            referred = %referred.id(),
            amount = %format_minor(bonus),
            "referral bonus paid"
        );

        let notification = Notification::new(
            NotificationKind::Earning,
            "Referral Bonus Earned!",
            &format!("You earned ${} for referring {}", format_minor(bonus), referred.name()),
        )
        .with_data("amount", &format_minor(bonus))
        .with_data("referred_user", referred.name());
        self.notify(&referrer, notification).await;

        Ok(ReferralOutcome::Paid { link, entry })
    }
}
