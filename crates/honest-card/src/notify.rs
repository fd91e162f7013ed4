//! Single-slot notification toast.
//!
//! At most one notice is shown; a new one replaces it. Notices expire
//! after a configurable duration (five seconds unless told otherwise).

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::error::Error;

pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Notice,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct Notifier {
    current: Option<Notice>,
    duration: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_DURATION)
    }
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn show(&mut self, severity: Severity, message: impl Into<String>) -> &Notice {
        self.show_for(severity, message, self.duration)
    }

    pub fn show_for(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        duration: Duration,
    ) -> &Notice {
        self.current.insert(Notice {
            severity,
            message: message.into(),
            expires_at: Instant::now() + duration,
        })
    }

    pub fn notice(&mut self, message: impl Into<String>) -> &Notice {
        self.show(Severity::Notice, message)
    }

    pub fn success(&mut self, message: impl Into<String>) -> &Notice {
        self.show(Severity::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> &Notice {
        self.show(Severity::Error, message)
    }

    /// The notice still visible at `now`, if any.
    pub fn current(&self, now: Instant) -> Option<&Notice> {
        self.current.as_ref().filter(|notice| now < notice.expires_at)
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// Turn the outcome of a user action into one notice. Errors are logged
    /// and shown with their user message, or `fallback` when the remote
    /// side gave none.
    pub fn report<T>(
        &mut self,
        result: &Result<T, Error>,
        success: &str,
        fallback: &str,
    ) -> &Notice {
        match result {
            Ok(_) => {
                info!("{success}");
                self.success(success)
            }
            Err(err) => {
                error!(%err, "{fallback}");
                self.error(err.user_message(fallback))
            }
        }
    }
}
