//! Transient user notifications.

use std::io::Write;
use std::time::Duration;

/// Fire-and-forget success and error messages.
pub trait Notifier: Send + Sync {
    fn show_success(&self, message: &str);
    fn show_error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Top,
    Bottom,
}

/// Presentation settings shared by every notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierOptions {
    /// How long a notification stays visible.
    pub duration: Duration,
    pub position: (Horizontal, Vertical),
    pub ripple: bool,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(4000),
            position: (Horizontal::Right, Vertical::Top),
            ripple: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Success,
    Error,
}

/// Terminal notifier: successes on stdout, errors on stderr.
///
/// Terminal lines do not expire or move, so the options only travel with the
/// trace event emitted for each notification.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier {
    options: NotifierOptions,
}

impl ConsoleNotifier {
    pub fn new(options: NotifierOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NotifierOptions {
        &self.options
    }

    /// The line printed for a notification.
    pub fn render(kind: Kind, message: &str) -> String {
        match kind {
            Kind::Success => format!("✓ {message}"),
            Kind::Error => format!("✗ {message}"),
        }
    }

    fn trace(&self, kind: Kind, message: &str) {
        let NotifierOptions { duration, position, ripple } = self.options;
        tracing::debug!(
            ?kind,
            message,
            duration_ms = duration.as_millis() as u64,
            horizontal = ?position.0,
            vertical = ?position.1,
            ripple,
            "Notification"
        );
    }
}

impl Notifier for ConsoleNotifier {
    fn show_success(&self, message: &str) {
        self.trace(Kind::Success, message);
        // A closed stdout is not worth failing a command over.
        let _ = writeln!(std::io::stdout(), "{}", Self::render(Kind::Success, message));
    }

    fn show_error(&self, message: &str) {
        self.trace(Kind::Error, message);
        let _ = writeln!(std::io::stderr(), "{}", Self::render(Kind::Error, message));
    }
}
