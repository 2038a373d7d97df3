// 🔔 Notifications - dismissible toasts shown over the dashboard

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a toast stays up unless dismissed
pub const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

/// Toast stack, newest last
pub struct Toasts {
    items: VecDeque<(Notification, Instant)>,
    ttl: Duration,
}

impl Toasts {
    pub fn new(ttl: Duration) -> Self {
        Toasts {
            items: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, notification: Notification, now: Instant) {
        self.items.push_back((notification, now));
        // Keep the stack short; oldest go first
        while self.items.len() > 3 {
            self.items.pop_front();
        }
    }

    pub fn extend(&mut self, notifications: impl IntoIterator<Item = Notification>, now: Instant) {
        for n in notifications {
            self.push(n, now);
        }
    }

    /// Dismiss the newest toast
    pub fn dismiss(&mut self) -> Option<Notification> {
        self.items.pop_back().map(|(n, _)| n)
    }

    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|(_, shown)| now.saturating_duration_since(*shown) < ttl);
    }

    pub fn current(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter().map(|(n, _)| n)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Toasts {
    fn default() -> Self {
        Toasts::new(TOAST_TTL)
    }
}
