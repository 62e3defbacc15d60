// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Headless messenger.

use std::time::Duration;

use super::{Messenger, Notice, NoticeLevel};

/// [`Messenger`] for processes without a UI.
///
/// Notices go to `tracing`; confirmations are answered immediately with a
/// fixed policy.
#[derive(Debug, Clone, Copy)]
pub struct LogMessenger {
    approve: bool,
}

impl LogMessenger {
    /// Creates a messenger that confirms every prompt.
    #[must_use]
    pub fn approving() -> Self {
        Self { approve: true }
    }

    /// Creates a messenger that declines every prompt.
    #[must_use]
    pub fn declining() -> Self {
        Self { approve: false }
    }
}

impl Messenger for LogMessenger {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(text = %notice.text, "Success"),
            NoticeLevel::Error => tracing::error!(text = %notice.text, "Error"),
            NoticeLevel::Warning => tracing::warn!(text = %notice.text, "Warning"),
        }
    }

    async fn confirm(&self, text: &str, _display: Duration) -> bool {
        tracing::info!(prompt = %text, answer = self.approve, "Auto-answering confirmation");
        self.approve
    }
}
