// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Messenger that hands notices and prompts to a UI task.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::{Messenger, Notice};

/// Message delivered to the UI.
#[derive(Debug)]
pub enum UiMessage {
    /// A notice to display.
    Notice(Notice),
    /// A prompt waiting for the user's answer.
    Confirm(PendingConfirmation),
}

/// An outstanding yes/no prompt.
///
/// [`resolve`](Self::resolve) consumes the prompt, so it can be answered
/// at most once. Holding it without answering keeps the asking operation
/// suspended; dropping it unanswered counts as a "no".
#[derive(Debug)]
pub struct PendingConfirmation {
    text: String,
    display: Duration,
    responder: oneshot::Sender<bool>,
}

impl PendingConfirmation {
    /// Returns the question text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns how long the prompt should stay visible.
    #[must_use]
    pub fn display(&self) -> Duration {
        self.display
    }

    /// Answers the prompt.
    pub fn resolve(self, answer: bool) {
        // The asking task may have been dropped; nothing to answer then
        let _ = self.responder.send(answer);
    }
}

/// [`Messenger`] backed by an unbounded channel.
///
/// # Examples
///
/// ```
/// use zonesync_lib::message::{ChannelMessenger, Messenger, UiMessage};
///
/// # async fn example() {
/// let (messenger, mut ui) = ChannelMessenger::new();
///
/// let answer = tokio::join!(
///     messenger.confirm("Delete this zone?", std::time::Duration::from_secs(10)),
///     async {
///         if let Some(UiMessage::Confirm(prompt)) = ui.recv().await {
///             prompt.resolve(true);
///         }
///     },
/// ).0;
/// assert!(answer);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChannelMessenger {
    tx: mpsc::UnboundedSender<UiMessage>,
}

impl ChannelMessenger {
    /// Creates a messenger and the receiver the UI reads from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Messenger for ChannelMessenger {
    fn notify(&self, notice: Notice) {
        if self.tx.send(UiMessage::Notice(notice)).is_err() {
            tracing::debug!("UI receiver gone, dropping notice");
        }
    }

    async fn confirm(&self, text: &str, display: Duration) -> bool {
        let (responder, answer) = oneshot::channel();
        let prompt = PendingConfirmation {
            text: text.to_string(),
            display,
            responder,
        };

        if self.tx.send(UiMessage::Confirm(prompt)).is_err() {
            tracing::warn!(prompt = %text, "UI receiver gone, treating confirmation as declined");
            return false;
        }

        answer.await.unwrap_or_else(|_| {
            tracing::debug!(prompt = %text, "Confirmation dropped without an answer");
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::NoticeLevel;

    #[test]
    fn notices_reach_the_ui() {
        let (messenger, mut ui) = ChannelMessenger::new();
        messenger.success("Zone North was created.");
        messenger.error("boom");

        let Ok(UiMessage::Notice(first)) = ui.try_recv() else {
            panic!("expected a notice");
        };
        assert_eq!(first.level, NoticeLevel::Success);

        let Ok(UiMessage::Notice(second)) = ui.try_recv() else {
            panic!("expected a notice");
        };
        assert_eq!(second.text, "boom");
    }

    #[tokio::test]
    async fn confirm_returns_user_answer() {
        let (messenger, mut ui) = ChannelMessenger::new();

        let (answer, ()) = tokio::join!(
            messenger.confirm("Delete?", Duration::from_secs(10)),
            async {
                let Some(UiMessage::Confirm(prompt)) = ui.recv().await else {
                    panic!("expected a prompt");
                };
                assert_eq!(prompt.text(), "Delete?");
                assert_eq!(prompt.display(), Duration::from_secs(10));
                prompt.resolve(false);
            }
        );
        assert!(!answer);
    }

    #[tokio::test]
    async fn dropped_prompt_counts_as_declined() {
        let (messenger, mut ui) = ChannelMessenger::new();

        let (answer, ()) = tokio::join!(messenger.confirm("Delete?", Duration::from_secs(5)), async {
            drop(ui.recv().await);
        });
        assert!(!answer);
    }

    #[tokio::test]
    async fn closed_ui_counts_as_declined() {
        let (messenger, ui) = ChannelMessenger::new();
        drop(ui);
        assert!(!messenger.confirm("Delete?", Duration::from_secs(5)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_prompt_stays_pending() {
        let (messenger, mut ui) = ChannelMessenger::new();

        let pending = tokio::time::timeout(
            Duration::from_secs(3600),
            messenger.confirm("Delete?", Duration::from_secs(5)),
        );
        let (result, prompt) = tokio::join!(pending, ui.recv());

        assert!(result.is_err());
        assert!(prompt.is_some());
    }
}
