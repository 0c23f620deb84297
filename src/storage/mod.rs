// Storage module - PERSISTENCE
// Accounts, ledger entries and referral links in sled, with every balance
// change committed in one transaction alongside its ledger entries

mod store;

pub use store::{StorageStats, StoreError, WalletStore};
