use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
    expires_at: Instant,
}

/// Transient success / error messages.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    pub fn success(&mut self, message: impl Into<String>, now: Instant) {
        self.push(NoticeLevel::Success, message.into(), now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.push(NoticeLevel::Error, message.into(), now);
    }

    fn push(&mut self, level: NoticeLevel, message: String, now: Instant) {
        match level {
            NoticeLevel::Success => tracing::info!("{}", message),
            NoticeLevel::Error => tracing::warn!("{}", message),
        }
        self.items.push(Notice {
            level,
            message,
            created_at: Utc::now(),
            expires_at: now + NOTICE_DURATION,
        });
    }

    /// Notices still showing at `now`; expired ones are dropped.
    pub fn active(&mut self, now: Instant) -> &[Notice] {
        self.items.retain(|n| n.expires_at > now);
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_expire() {
        let mut notices = Notices::default();
        let t0 = Instant::now();

        notices.success("Profile updated successfully", t0);
        notices.error("Failed to remove favorite", t0 + Duration::from_secs(2));

        assert_eq!(notices.active(t0 + Duration::from_secs(1)).len(), 2);
        let remaining = notices.active(t0 + Duration::from_secs(3));
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].level, NoticeLevel::Error);
        assert!(notices.active(t0 + Duration::from_secs(6)).is_empty());
    }
}
