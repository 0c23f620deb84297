// Ledger module - Append-only record of balance-affecting events
//
// Entries are immutable apart from the pending -> completed/failed/cancelled
// status transition. References correlate related entries (both sides of a
// transfer, a withdrawal and its payout).

mod entry;
mod query;
pub mod reference;

pub use entry::{EntryId, EntryKind, EntryStatus, LedgerEntry, LedgerError};
pub use query::{HistoryQuery, Page};
