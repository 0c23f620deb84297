// Notify module - Push notifications to account holders
// Sends are bounded by a timeout and failures are logged, never propagated

mod notifier;

pub use notifier::{dispatch, LogNotifier, MockNotifier, Notification, NotificationKind, Notifier, NotifyError};
