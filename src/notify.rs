//! Transient user notices.
//!
//! Success and error banners shown in the status area, auto-dismissed after
//! a level-dependent delay.

use std::time::{Duration, Instant};

const SUCCESS_VISIBLE: Duration = Duration::from_secs(3);
const ERROR_VISIBLE: Duration = Duration::from_secs(5);

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A message with an expiry.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    expires_at: Instant,
}

/// Holds the most recent notice; a new notice replaces the previous one.
#[derive(Debug, Default)]
pub struct Notifier {
    current: Option<Notice>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a success notice (visible 3 seconds).
    pub fn success(&mut self, text: impl Into<String>, now: Instant) {
        self.set(text.into(), NoticeLevel::Success, now + SUCCESS_VISIBLE);
    }

    /// Show an error notice (visible 5 seconds).
    pub fn error(&mut self, text: impl Into<String>, now: Instant) {
        self.set(text.into(), NoticeLevel::Error, now + ERROR_VISIBLE);
    }

    /// Show an informational notice (visible 3 seconds).
    pub fn info(&mut self, text: impl Into<String>, now: Instant) {
        self.set(text.into(), NoticeLevel::Info, now + SUCCESS_VISIBLE);
    }

    /// The active notice, dropping it once expired.
    pub fn current(&mut self, now: Instant) -> Option<&Notice> {
        if let Some(notice) = &self.current
            && now >= notice.expires_at
        {
            self.current = None;
        }
        self.current.as_ref()
    }

    fn set(&mut self, text: String, level: NoticeLevel, expires_at: Instant) {
        self.current = Some(Notice {
            text,
            level,
            expires_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_dismisses_after_three_seconds() {
        let now = Instant::now();
        let mut notifier = Notifier::new();
        notifier.success("saved", now);
        assert!(notifier.current(now + Duration::from_secs(2)).is_some());
        assert!(notifier.current(now + Duration::from_secs(3)).is_none());
    }

    #[test]
    fn test_error_outlives_success_window() {
        let now = Instant::now();
        let mut notifier = Notifier::new();
        notifier.error("rejected", now);
        let visible = notifier.current(now + Duration::from_secs(4)).unwrap();
        assert_eq!(visible.level, NoticeLevel::Error);
        assert!(notifier.current(now + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_new_notice_replaces_previous() {
        let now = Instant::now();
        let mut notifier = Notifier::new();
        notifier.error("first", now);
        notifier.success("second", now + Duration::from_secs(1));
        let visible = notifier.current(now + Duration::from_secs(2)).unwrap();
        assert_eq!(visible.text, "second");
    }
}
