// OTP Tests
// Expiring single-use codes

use chrono::{Duration as ChronoDuration, Utc};
use quizwallet::otp::{OtpError, OtpStore, OTP_LEN};
use quizwallet::storage::WalletStore;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn otp_store(ttl_secs: u64) -> OtpStore {
    let store = WalletStore::temporary().unwrap();
    OtpStore::open(&store, Duration::from_secs(ttl_secs)).unwrap()
}

#[test]
fn test_issue_six_digits() {
    let otp = otp_store(600);
    let code = otp.issue("ada@example.com").unwrap();

    assert_eq!(code.len(), OTP_LEN);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(otp.len(), 1);
}

#[test]
fn test_verify_consumes_code() {
    let otp = otp_store(600);
    let code = otp.issue("ada@example.com").unwrap();

    assert!(otp.verify("ADA@example.com ", &code).unwrap());
    assert!(!otp.verify("ada@example.com", &code).unwrap());
    assert!(otp.is_empty());
}

#[test]
fn test_wrong_code_keeps_stored_one() {
    let otp = otp_store(600);
    let code = otp.issue("ada@example.com").unwrap();
    let wrong = if code == "123456" { "654321" } else { "123456" };

    assert!(!otp.verify("ada@example.com", wrong).unwrap());
    assert!(otp.verify("ada@example.com", &code).unwrap());
}

#[test]
fn test_reissue_replaces_code() {
    let otp = otp_store(600);
    let now = Utc::now();
    otp.issue_at("ada@example.com", now).unwrap();
    let latest = otp.issue_at("ada@example.com", now).unwrap();

    assert_eq!(otp.len(), 1);
    assert!(otp.verify_at("ada@example.com", &latest, now).unwrap());
}

#[test]
fn test_expired_code_rejected_and_removed() {
    let otp = otp_store(60);
    let issued = Utc::now();
    let code = otp.issue_at("ada@example.com", issued).unwrap();

    // Exactly at expiry the code still works
    let at_expiry = issued + ChronoDuration::seconds(60);
    let later = at_expiry + ChronoDuration::milliseconds(1);

    assert!(!otp.verify_at("ada@example.com", &code, later).unwrap());
    assert!(otp.is_empty());

    let code = otp.issue_at("ada@example.com", issued).unwrap();
    assert!(otp.verify_at("ada@example.com", &code, at_expiry).unwrap());
}

#[test]
fn test_unknown_email_is_false() {
    let otp = otp_store(600);
    assert!(!otp.verify("nobody@example.com", "123456").unwrap());
}

#[test]
fn test_invalid_email_rejected() {
    let otp = otp_store(600);
    assert!(matches!(otp.issue("not-an-email"), Err(OtpError::InvalidEmail(_))));
}

#[test]
fn test_sweep_removes_only_expired() {
    let otp = otp_store(60);
    let now = Utc::now();
    otp.issue_at("old@example.com", now - ChronoDuration::seconds(120)).unwrap();
    otp.issue_at("new@example.com", now).unwrap();

    assert_eq!(otp.sweep_expired_at(now).unwrap(), 1);
    assert_eq!(otp.len(), 1);
    assert_eq!(otp.sweep_expired_at(now).unwrap(), 0);
}

#[test]
fn test_concurrent_verify_accepts_code_once() {
    let otp = otp_store(600);

    for _ in 0..100 {
        let code = otp.issue("race@example.com").unwrap();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let otp = otp.clone();
                let code = code.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    otp.verify("race@example.com", &code).unwrap()
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
        assert!(otp.is_empty());
    }
}
