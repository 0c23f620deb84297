// quizwallet CLI - runs wallet operations against a local store
// Every command prints a JSON envelope and exits non-zero on failure

use clap::{Args, Parser, Subcommand};
use quizwallet::account::{AccountId, Currency, NewAccount};
use quizwallet::api::{parse_money, AccountDetails, Envelope, QuizBody, TransferBody, WithdrawBody};
use quizwallet::config::WalletConfig;
use quizwallet::ledger::{EntryKind, HistoryQuery};
use quizwallet::otp::OtpStore;
use quizwallet::wallet::{Resolution, Wallet, WalletError};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quizwallet", version, about = "Quiz rewards wallet ledger")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Settings {
    /// Directory holding the wallet database
    #[arg(long, env = "QUIZWALLET_DATA_DIR", default_value = "quizwallet-data")]
    data_dir: PathBuf,

    /// Smallest withdrawal accepted, in dollars
    #[arg(long, env = "QUIZWALLET_MIN_WITHDRAWAL", default_value_t = 10.0)]
    min_withdrawal: f64,

    /// Bonus paid to a referrer, in dollars
    #[arg(long, env = "QUIZWALLET_REFERRAL_BONUS", default_value_t = 5.0)]
    referral_bonus: f64,

    /// Notification send timeout in milliseconds
    #[arg(long, env = "QUIZWALLET_NOTIFY_TIMEOUT_MS", default_value_t = 5_000)]
    notify_timeout_ms: u64,

    /// One-time code lifetime in seconds
    #[arg(long, env = "QUIZWALLET_OTP_TTL_SECS", default_value_t = 600)]
    otp_ttl_secs: u64,
}

impl Settings {
    fn to_config(&self) -> Result<WalletConfig, WalletError> {
        let config = WalletConfig::new()
            .with_data_dir(&self.data_dir)
            .with_min_withdrawal(parse_money(self.min_withdrawal, true)?)
            .with_referral_bonus(parse_money(self.referral_bonus, false)?)
            .with_notify_timeout_ms(self.notify_timeout_ms)
            .with_otp_ttl_secs(self.otp_ttl_secs);
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open an account
    Open {
        name: String,
        email: String,
        #[arg(long)]
        phone: Option<String>,
        /// Referral code of the inviting account
        #[arg(long)]
        referral_code: Option<String>,
        #[arg(long)]
        admin: bool,
    },
    /// Show cash, points and coin balances
    Balance { account: AccountId },
    /// Credit cash or coins (admin only)
    Grant {
        #[arg(long = "as")]
        admin: AccountId,
        account: AccountId,
        amount: f64,
        #[arg(long, default_value = "coin")]
        currency: Currency,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Send coins to the account registered to a phone number
    Transfer {
        #[arg(long)]
        from: AccountId,
        #[arg(long)]
        to_phone: String,
        amount: f64,
        #[arg(long)]
        note: Option<String>,
    },
    /// Withdraw cash
    Withdraw {
        account: AccountId,
        amount: f64,
        /// bank_transfer, mobile_money or paypal
        #[arg(long)]
        method: String,
        #[arg(long)]
        account_name: Option<String>,
        #[arg(long)]
        account_number: Option<String>,
        #[arg(long)]
        bank_code: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Close a pending withdrawal (admin only)
    Resolve {
        #[arg(long = "as")]
        admin: AccountId,
        reference: String,
        /// Mark failed and refund instead of completed
        #[arg(long)]
        failed: bool,
    },
    /// Record a scored quiz
    Quiz {
        account: AccountId,
        correct_answers: u32,
        total_questions: u32,
        #[arg(long, default_value_t = 0.0)]
        earnings: f64,
        #[arg(long, default_value_t = 0)]
        points: u64,
    },
    /// Pay the referral bonus for a referred account
    ReferBonus { account: AccountId },
    /// Transaction history, newest first
    History {
        account: AccountId,
        #[arg(long)]
        kind: Option<EntryKind>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Entries sharing a reference
    Reference { reference: String },
    /// Referral code, counts and bonuses
    Referrals { account: AccountId },
    /// Compare balances with ledger sums
    Reconcile { account: AccountId },
    /// One-time codes
    Otp {
        #[command(subcommand)]
        command: OtpCommand,
    },
}

#[derive(Subcommand, Debug)]
enum OtpCommand {
    Issue { email: String },
    Verify { email: String, code: String },
    Sweep,
}

fn to_data<T: Serialize>(value: T) -> Result<Value, WalletError> {
    serde_json::to_value(value).map_err(|e| WalletError::Internal(e.to_string()))
}

async fn run(wallet: &Wallet, command: Command) -> Result<Value, WalletError> {
    match command {
        Command::Open {
            name,
            email,
            phone,
            referral_code,
            admin,
        } => {
            let mut input = NewAccount::new(&name, &email);
            if let Some(phone) = phone.as_deref() {
                input = input.with_phone(phone);
            }
            if let Some(code) = referral_code.as_deref() {
                input = input.with_referral_code(code);
            }
            if admin {
                input = input.admin();
            }
            to_data(wallet.open_account(input)?)
        }
        Command::Balance { account } => to_data(wallet.balances(&account)?),
        Command::Grant {
            admin,
            account,
            amount,
            currency,
            description,
        } => {
            let amount = parse_money(amount, false)?;
            to_data(wallet.grant(&admin, &account, currency, amount, &description).await?)
        }
        Command::Transfer {
            from,
            to_phone,
            amount,
            note,
        } => {
            let request = TransferBody {
                recipient_phone: Some(to_phone),
                amount,
                note,
            }
            .validate()?;
            to_data(wallet.transfer_coins(&from, request).await?)
        }
        Command::Withdraw {
            account,
            amount,
            method,
            account_name,
            account_number,
            bank_code,
            phone,
            email,
        } => {
            let request = WithdrawBody {
                amount,
                method,
                account_details: AccountDetails {
                    account_name,
                    account_number,
                    bank_code,
                    phone,
                    email,
                },
            }
            .validate()?;
            to_data(wallet.withdraw(&account, request).await?)
        }
        Command::Resolve {
            admin,
            reference,
            failed,
        } => {
            let resolution = if failed { Resolution::Failed } else { Resolution::Completed };
            to_data(wallet.resolve_withdrawal(&admin, &reference, resolution).await?)
        }
        Command::Quiz {
            account,
            correct_answers,
            total_questions,
            earnings,
            points,
        } => {
            let submission = QuizBody {
                correct_answers,
                total_questions,
                total_earnings: earnings,
                total_points: points,
            }
            .validate()?;
            to_data(wallet.submit_quiz(&account, submission).await?)
        }
        Command::ReferBonus { account } => to_data(wallet.credit_referral_bonus(&account).await?),
        Command::History {
            account,
            kind,
            page,
            limit,
        } => {
            let mut query = HistoryQuery::new()
                .with_page(page)
                .with_limit(limit.unwrap_or(wallet.config().history_page_size));
            if let Some(kind) = kind {
                query = query.with_kind(kind);
            }
            to_data(wallet.history(&account, &query)?)
        }
        Command::Reference { reference } => to_data(wallet.entries_by_reference(&reference)?),
        Command::Referrals { account } => to_data(wallet.referral_stats(&account)?),
        Command::Reconcile { account } => to_data(wallet.reconcile(&account)?),
        Command::Otp { command } => {
            let otp = OtpStore::open(wallet.store(), wallet.config().otp_ttl())?;
            match command {
                OtpCommand::Issue { email } => Ok(json!({ "code": otp.issue(&email)? })),
                OtpCommand::Verify { email, code } => Ok(json!({ "valid": otp.verify(&email, &code)? })),
                OtpCommand::Sweep => Ok(json!({ "removed": otp.sweep_expired()? })),
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.settings.to_config().and_then(Wallet::open) {
        Ok(wallet) => {
            let result = run(&wallet, cli.command).await;
            if let Err(e) = wallet.store().flush() {
                tracing::error!(error = %e, "flush failed");
            }
            result
        }
        Err(e) => Err(e),
    };

    let envelope = Envelope::from_result(result);
    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to render response: {}", e),
    }

    if envelope.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
