//! Transient error banner.
//!
//! One message at a time, shown as `Error: <message>` and cleared automatically
//! once its timeout has passed. A newer error replaces the shown one and restarts
//! the timer.

use std::time::Duration;

use tokio::time::Instant;

/// Default time an error stays visible.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Element id of the banner in the assembled page.
pub const BANNER_ID: &str = "error-bar";

#[derive(Debug, Clone)]
struct Shown {
    text: String,
    since: Instant,
}

/// Error banner state.
#[derive(Debug, Clone)]
pub struct ErrorBanner {
    timeout: Duration,
    shown: Option<Shown>,
}

impl Default for ErrorBanner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ErrorBanner {
    /// Banner clearing messages after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            shown: None,
        }
    }

    /// Show `message`, replacing whatever is shown and restarting the timer.
    pub fn set_error(&mut self, message: &str) {
        self.shown = Some(Shown {
            text: format!("Error: {message}"),
            since: Instant::now(),
        });
    }

    /// Remove the message now.
    pub fn clear(&mut self) {
        self.shown = None;
    }

    /// Text currently shown, if it has not timed out.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.shown
            .as_ref()
            .filter(|shown| shown.since.elapsed() < self.timeout)
            .map(|shown| shown.text.as_str())
    }

    /// Banner markup for the assembled page.
    #[must_use]
    pub fn html(&self) -> String {
        format!(
            "<div class=\"error-bar\" id=\"{BANNER_ID}\">{}</div>",
            crate::dom::escape(self.current().unwrap_or_default())
        )
    }
}
