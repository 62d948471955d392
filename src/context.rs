//! Cancellation and deadline carried by every pool call.
//!
//! A [`Context`] pairs a [`CancellationToken`] with an optional deadline.
//! The pool checks it in two places: the caller stops waiting as soon as
//! the context is done, and the actor drops requests whose context was
//! already done when they were dequeued.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use wspool::Context;
//!
//! let ctx = Context::with_timeout(Duration::from_secs(5));
//! let child = ctx.child();
//! ctx.cancel();
//! assert!(child.is_done());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::error::Error;

// ============================================================================
// Context
// ============================================================================

/// Cancellation token plus optional deadline for one call.
///
/// Cloning shares the token: cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Cancellation signal.
    token: CancellationToken,
    /// Absolute deadline and the timeout it was derived from.
    deadline: Option<(Instant, Duration)>,
}

// ============================================================================
// Context - Constructors
// ============================================================================

impl Context {
    /// Creates a context that is only done once cancelled.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context driven by an existing token.
    #[inline]
    #[must_use]
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Creates a context whose deadline is `timeout` from now.
    #[inline]
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().timeout(timeout)
    }

    /// Returns a copy of this context with a deadline `timeout` from now.
    ///
    /// An earlier existing deadline is kept. A timeout too large for the
    /// clock to represent adds no deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let Some(at) = Instant::now().checked_add(timeout) else {
            return self;
        };
        match self.deadline {
            Some((existing, _)) if existing <= at => {}
            _ => self.deadline = Some((at, timeout)),
        }
        self
    }

    /// Returns a child context.
    ///
    /// Cancelling the parent cancels the child, not the other way round.
    /// The child inherits the parent's deadline.
    #[inline]
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }
}

// ============================================================================
// Context - State
// ============================================================================

impl Context {
    /// Returns the underlying cancellation token.
    #[inline]
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the deadline, if any.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.map(|(at, _)| at)
    }

    /// Cancels this context and every child derived from it.
    #[inline]
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the reason this context is done, or `None` while it is live.
    #[must_use]
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            return Some(Error::Cancelled);
        }

        match self.deadline {
            Some((at, timeout)) if Instant::now() >= at => {
                Some(Error::deadline_exceeded(timeout.as_millis() as u64))
            }
            _ => None,
        }
    }

    /// Returns `true` once cancelled or past the deadline.
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Waits until the context is done and returns the reason.
    pub async fn done(&self) -> Error {
        match self.deadline {
            Some((at, timeout)) => {
                tokio::select! {
                    () = self.token.cancelled() => Error::Cancelled,
                    () = sleep_until(at) => Error::deadline_exceeded(timeout.as_millis() as u64),
                }
            }
            None => {
                self.token.cancelled().await;
                Error::Cancelled
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_live() {
        let ctx = Context::new();
        assert!(!ctx.is_done());
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_propagates_to_clones_and_children() {
        let ctx = Context::new();
        let clone = ctx.clone();
        let child = ctx.child();

        ctx.cancel();

        assert!(matches!(clone.err(), Some(Error::Cancelled)));
        assert!(matches!(child.err(), Some(Error::Cancelled)));
    }

    #[test]
    fn test_child_cancel_leaves_parent_live() {
        let ctx = Context::new();
        let child = ctx.child();

        child.cancel();

        assert!(child.is_done());
        assert!(!ctx.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let ctx = Context::with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_done());

        let err = ctx.done().await;
        assert!(matches!(err, Error::DeadlineExceeded { timeout_ms: 50 }));
        assert!(matches!(
            ctx.err(),
            Some(Error::DeadlineExceeded { timeout_ms: 50 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_wins() {
        let ctx = Context::with_timeout(Duration::from_millis(10)).timeout(Duration::from_secs(10));
        let err = ctx.done().await;
        assert!(matches!(err, Error::DeadlineExceeded { timeout_ms: 10 }));
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_adds_no_deadline() {
        let ctx = Context::with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_done());

        let bounded = Context::with_timeout(Duration::from_secs(5)).timeout(Duration::MAX);
        assert!(bounded.deadline().is_some());
    }

    #[tokio::test]
    async fn test_done_on_cancel() {
        let ctx = Context::new();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });

        ctx.cancel();

        let err = handle.await.expect("task should not panic");
        assert!(matches!(err, Error::Cancelled));
    }
}
