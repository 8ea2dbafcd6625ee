//! User-facing error surface for delivery failures.

/// Shows a short error to the end user. Must not block or fail.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, text: &str);
}

/// Writes notifications to stderr, for hosts whose user is at a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify_error(&self, text: &str) {
        eprintln!("{}", text);
    }
}
