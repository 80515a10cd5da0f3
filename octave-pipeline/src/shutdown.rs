// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Cancellation Token
//!
//! A lightweight, cloneable cancellation signal, ported from the teacher
//! crate's `shutdown::CancellationToken` and extended with a parent link:
//! one token is held by the `Pipeline` and shared into every cycle/worker;
//! a second, independent token is minted per `Sink` so a single file's
//! discard can't cancel its siblings (spec.md §5's "each sink is owned by
//! exactly one worker"), while still observing the pipeline-wide token for
//! as long as it lives — cancelling the pipeline mid-cycle must still abort
//! every in-flight sink, not just ones created after the cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Cloneable handle onto a shared cancellation flag, optionally chained to
/// a parent token whose cancellation is observed for the handle's whole
/// lifetime (not just snapshotted at creation).
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
    parent: Option<Box<CancellationToken>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), notify: Arc::new(Notify::new()), parent: None }
    }

    /// Derives a child token: cancelling the child never cancels `self`,
    /// but the child's [`is_cancelled`](Self::is_cancelled)/[`cancelled`](Self::cancelled)
    /// also reflect `self`'s cancellation at any future point, not merely
    /// whatever state `self` was in when the child was created.
    pub fn child(&self) -> CancellationToken {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
            parent: Some(Box::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.parent.as_deref().is_some_and(CancellationToken::is_cancelled)
    }

    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        match &self.parent {
            Some(parent) => {
                tokio::select! {
                    _ = self.notify.notified() => {}
                    _ = Box::pin(parent.cancelled()) => {}
                }
            }
            None => self.notify.notified().await,
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_can_be_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_observe_the_same_cancellation() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn a_child_inherits_an_already_cancelled_parent() {
        let parent = CancellationToken::new();
        parent.cancel();
        let child = parent.child();
        assert!(child.is_cancelled());
    }

    #[test]
    fn cancelling_a_child_does_not_cancel_the_parent() {
        let parent = CancellationToken::new();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_once_cancel_is_called() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        token.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn a_child_observes_a_parent_cancelled_after_the_child_was_created() {
        let parent = CancellationToken::new();
        let child = parent.child();
        assert!(!child.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_when_the_parent_is_cancelled_after_the_child_was_created() {
        let parent = CancellationToken::new();
        let child = parent.child();
        let handle = tokio::spawn(async move {
            child.cancelled().await;
        });
        parent.cancel();
        handle.await.unwrap();
    }
}
