// Quiz reward crediting

use super::{ReferralOutcome, Wallet, WalletError};
use crate::account::{format_minor, AccountId, Balances};
use crate::ledger::{EntryKind, LedgerEntry};
use serde::Serialize;
use tracing::{info, warn};

/// A scored quiz as reported by the client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizSubmission {
    pub correct_answers: u32,
    pub total_questions: u32,
    /// Cash earned, minor units
    pub earnings: u64,
    pub points: u64,
}

impl QuizSubmission {
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.total_questions == 0 {
            return Err(WalletError::InvalidInput("Quiz must contain at least one question".to_string()));
        }
        if self.correct_answers > self.total_questions {
            return Err(WalletError::InvalidInput(
                "Correct answers cannot exceed total questions".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct QuizReceipt {
    pub balances: Balances,
    pub entry: Option<LedgerEntry>,
    pub first_quiz: bool,
    /// Set on the first quiz only
    pub referral: Option<ReferralOutcome>,
}

impl Wallet {
    /// Credit quiz earnings and points. The first quiz an account completes
    /// also pays its referrer; a failure there is logged, not returned.
    pub async fn submit_quiz(&self, account_id: &AccountId, submission: QuizSubmission) -> Result<QuizReceipt, WalletError> {
        submission.validate()?;
        self.require_account(account_id)?;

        let entry = if submission.earnings > 0 {
            let description = format!(
                "Quiz reward: {}/{} correct",
                submission.correct_answers, submission.total_questions
            );
            Some(
                LedgerEntry::credit(*account_id, EntryKind::QuizReward, submission.earnings, &description)?
                    .with_metadata("correct_answers", &submission.correct_answers.to_string())
                    .with_metadata("total_questions", &submission.total_questions.to_string())
                    .with_metadata("points", &submission.points.to_string()),
            )
        } else {
            None
        };

        let account = self
            .store
            .record_quiz(account_id, submission.earnings, submission.points, entry.as_ref())?;
        let first_quiz = account.quizzes_completed() == 1;

        info!(
            account = %account_id,
            earnings = %format_minor(submission.earnings),
            points = submission.points,
            first_quiz,
            "quiz reward credited"
        );

        let referral = if first_quiz {
            match self.credit_referral_bonus(account_id).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!(account = %account_id, error = %e, "referral bonus failed after first quiz");
                    None
                }
            }
        } else {
            None
        };

        Ok(QuizReceipt {
            balances: account.balances(),
            entry,
            first_quiz,
            referral,
        })
    }
}
