// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User-facing notices and confirmation prompts.
//!
//! Services report outcomes through a [`Messenger`]: short notices
//! (success, error, warning) and yes/no confirmations before destructive
//! actions. The library ships two implementations:
//!
//! - [`ChannelMessenger`]: forwards everything to a UI task over a channel
//! - [`LogMessenger`]: headless, writes notices to `tracing` and answers
//!   confirmations with a fixed policy

mod channel_messenger;
mod log_messenger;

use std::time::Duration;

pub use channel_messenger::{ChannelMessenger, PendingConfirmation, UiMessage};
pub use log_messenger::LogMessenger;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
    /// Something needs the user's attention.
    Warning,
}

/// A transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub text: String,
    /// How long the message stays on screen.
    pub display: Duration,
}

impl Notice {
    /// Default on-screen time.
    pub const DEFAULT_DISPLAY: Duration = Duration::from_secs(10);

    /// Creates a notice with the default display time.
    #[must_use]
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            display: Self::DEFAULT_DISPLAY,
        }
    }

    /// Creates a success notice.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    /// Creates an error notice.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, text)
    }

    /// Creates a warning notice.
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, text)
    }

    /// Overrides the display time.
    #[must_use]
    pub fn with_display(mut self, display: Duration) -> Self {
        self.display = display;
        self
    }
}

/// Sink for notices and source of confirmations.
#[allow(async_fn_in_trait)]
pub trait Messenger: Send + Sync {
    /// Shows a notice. Never blocks.
    fn notify(&self, notice: Notice);

    /// Asks a yes/no question.
    ///
    /// `display` is how long the prompt stays visible, not an operation
    /// timeout: the future completes only once the user answers.
    async fn confirm(&self, text: &str, display: Duration) -> bool;

    /// Shows a success notice.
    fn success(&self, text: &str) {
        self.notify(Notice::success(text));
    }

    /// Shows an error notice.
    fn error(&self, text: &str) {
        self.notify(Notice::error(text));
    }

    /// Shows a warning notice.
    fn warning(&self, text: &str) {
        self.notify(Notice::warning(text));
    }
}
