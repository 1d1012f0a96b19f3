use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A user-facing message produced by the schedule service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, message)
    }
}

/// Notifications currently on screen. Errors stay twice as long.
#[derive(Debug)]
pub struct Toasts {
    items: Vec<(Notification, Instant)>,
    lifetime: Duration,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl Toasts {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            items: Vec::new(),
            lifetime,
        }
    }

    pub fn push(&mut self, notification: Notification, now: Instant) {
        self.items.push((notification, now));
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    /// Drop expired notifications.
    pub fn prune(&mut self, now: Instant) {
        let lifetime = self.lifetime;
        self.items.retain(|(n, created)| {
            let ttl = if n.level == NotificationLevel::Error {
                lifetime * 2
            } else {
                lifetime
            };
            now.saturating_duration_since(*created) < ttl
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter().map(|(n, _)| n)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_outlive_other_toasts() {
        let start = Instant::now();
        let mut toasts = Toasts::new(Duration::from_secs(5));
        toasts.push(Notification::success("Rescheduled", "SCH/00001 moved"), start);
        toasts.push(Notification::error("Load failed", "timeout"), start);

        toasts.prune(start + Duration::from_secs(6));
        let left: Vec<_> = toasts.iter().map(|n| n.level).collect();
        assert_eq!(left, [NotificationLevel::Error]);

        toasts.prune(start + Duration::from_secs(11));
        assert!(toasts.is_empty());
    }

    #[test]
    fn dismiss_ignores_out_of_range() {
        let mut toasts = Toasts::default();
        toasts.push(Notification::info("Refreshed", ""), Instant::now());
        toasts.dismiss(3);
        assert_eq!(toasts.iter().count(), 1);
        toasts.dismiss(0);
        assert!(toasts.is_empty());
    }
}
