//! Transient user notifications.
//!
//! At most one notification is shown. A new one replaces the old one and
//! each disappears once its time to live has passed on the tokio clock.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Error,
    Success,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

#[derive(Debug)]
pub struct Notifications {
    current: Option<(Notification, Instant)>,
    ttl: Duration,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self { current: None, ttl }
    }

    pub fn post(&mut self, notification: Notification) {
        log::debug!(
            "[NOTIFY] {}: {}",
            notification.kind,
            notification.message
        );
        self.current = Some((notification, Instant::now() + self.ttl));
    }

    /// The notification on screen, if it has not expired yet.
    pub fn current(&mut self) -> Option<&Notification> {
        if matches!(&self.current, Some((_, expires)) if Instant::now() >= *expires) {
            self.current = None;
        }
        self.current.as_ref().map(|(n, _)| n)
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
