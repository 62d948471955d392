//! Best-effort graceful close.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, warn};

use super::Connection;

// ============================================================================
// Teardown
// ============================================================================

/// Closes a connection, logging instead of returning failures.
///
/// The close notification is attempted first; the transport is closed
/// whether or not that succeeded. The connection is consumed either way.
pub async fn teardown<C: Connection>(mut conn: C) {
    if let Err(e) = conn.send_close().await {
        warn!(error = %e, "Failed to send close notification");
    }

    if let Err(e) = conn.shutdown().await {
        warn!(error = %e, "Failed to close connection");
    }

    debug!("Connection torn down");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::{Error, Result};

    #[derive(Default)]
    struct Calls {
        send_close: AtomicUsize,
        shutdown: AtomicUsize,
    }

    struct FlakyConn {
        calls: Arc<Calls>,
        fail_send_close: bool,
        fail_shutdown: bool,
    }

    #[async_trait]
    impl Connection for FlakyConn {
        async fn send_close(&mut self) -> Result<()> {
            self.calls.send_close.fetch_add(1, Ordering::SeqCst);
            if self.fail_send_close {
                return Err(Error::ConnectionClosed);
            }
            Ok(())
        }

        async fn shutdown(self) -> Result<()> {
            self.calls.shutdown.fetch_add(1, Ordering::SeqCst);
            if self.fail_shutdown {
                return Err(Error::connection("already reset"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_teardown_runs_both_steps() {
        let calls = Arc::new(Calls::default());
        let conn = FlakyConn {
            calls: Arc::clone(&calls),
            fail_send_close: false,
            fail_shutdown: false,
        };

        teardown(conn).await;

        assert_eq!(calls.send_close.load(Ordering::SeqCst), 1);
        assert_eq!(calls.shutdown.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_closes_after_failed_notification() {
        let calls = Arc::new(Calls::default());
        let conn = FlakyConn {
            calls: Arc::clone(&calls),
            fail_send_close: true,
            fail_shutdown: true,
        };

        // Must not panic or propagate.
        teardown(conn).await;

        assert_eq!(calls.send_close.load(Ordering::SeqCst), 1);
        assert_eq!(calls.shutdown.load(Ordering::SeqCst), 1);
    }
}
