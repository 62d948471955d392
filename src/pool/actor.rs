//! Connection actor: the single task that owns the pooled connection.
//!
//! # Event Loop
//!
//! The actor reacts to exactly two event sources:
//!
//! - The request queue: open the connection if needed, run one unit of
//!   work, route the result back, then reset the expiry timer and sleep
//!   for the throttle delay
//! - The expiry timer: tear down the idle connection
//!
//! Work runs strictly one request at a time. The loop only ends when every
//! sender of the request queue is gone.
//!
//! # Connection States
//!
//! ```text
//! ABSENT ──connect ok──► OPEN ──abnormal close / ttl expiry──► ABSENT
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, trace, warn};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::transport::{Connector, teardown};

use super::config::PoolConfig;

// ============================================================================
// Constants
// ============================================================================

/// Fallback horizon when `now + ttl` overflows the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

// ============================================================================
// Disposition
// ============================================================================

/// What to do with the connection after a unit of work.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// Keep the connection for the next request.
    Keep,
    /// The transport is unusable; tear it down.
    Discard {
        /// Error message reported by the work.
        reason: String,
    },
}

// ============================================================================
// Job
// ============================================================================

/// Type-erased unit of work plus its response slot.
pub(crate) trait Job<C>: Send {
    /// Runs the work and routes its result to the caller.
    fn run<'c>(self: Box<Self>, conn: &'c mut C) -> BoxFuture<'c, Disposition>;

    /// Routes an error to the caller without running the work.
    fn fail(self: Box<Self>, err: Error);
}

/// A caller's work closure and the sender half of its response slot.
pub(crate) struct Pending<F, T> {
    work: F,
    response_tx: oneshot::Sender<Result<T>>,
}

impl<F, T> Pending<F, T> {
    pub(crate) fn new(work: F, response_tx: oneshot::Sender<Result<T>>) -> Self {
        Self { work, response_tx }
    }
}

impl<C, F, T> Job<C> for Pending<F, T>
where
    C: Send + 'static,
    F: for<'c> FnOnce(&'c mut C) -> BoxFuture<'c, Result<T>> + Send + 'static,
    T: Send + 'static,
{
    fn run<'c>(self: Box<Self>, conn: &'c mut C) -> BoxFuture<'c, Disposition> {
        let Pending { work, response_tx } = *self;

        Box::pin(async move {
            // A panic must not take the actor down; the connection it was
            // using is left in an unknown state and gets discarded.
            let (result, disposition) =
                match AssertUnwindSafe(async move { work(conn).await }).catch_unwind().await {
                    Ok(result) => {
                        let disposition = match &result {
                            Err(e) if e.is_abnormal_close() => Disposition::Discard {
                                reason: e.to_string(),
                            },
                            _ => Disposition::Keep,
                        };
                        (result, disposition)
                    }
                    Err(payload) => {
                        let err = Error::work_panicked(panic_message(payload.as_ref()));
                        let reason = err.to_string();
                        (Err(err), Disposition::Discard { reason })
                    }
                };

            // The caller may have stopped listening; never block on it.
            let _ = response_tx.send(result);

            disposition
        })
    }

    fn fail(self: Box<Self>, err: Error) {
        let _ = self.response_tx.send(Err(err));
    }
}

// ============================================================================
// Request
// ============================================================================

/// One queued call: the caller's context and its job.
pub(crate) struct Request<C> {
    pub(crate) ctx: Context,
    pub(crate) job: Box<dyn Job<C>>,
}

// ============================================================================
// ConnectionActor
// ============================================================================

/// Sole owner of the pooled connection.
pub(crate) struct ConnectionActor<K: Connector> {
    /// Opens new connections.
    connector: Arc<K>,
    /// Timing settings.
    config: PoolConfig,
    /// The connection, absent until first use and after teardown.
    conn: Option<K::Conn>,
}

impl<K: Connector> ConnectionActor<K> {
    pub(crate) fn new(connector: Arc<K>, config: PoolConfig) -> Self {
        Self {
            connector,
            config,
            conn: None,
        }
    }

    /// Serves requests until the queue closes.
    pub(crate) async fn run(mut self, mut request_rx: mpsc::Receiver<Request<K::Conn>>) {
        let expiry = sleep(self.config.ttl);
        tokio::pin!(expiry);

        // Set once the current deadline has fired, so a spent timer is not
        // polled again until it is reset.
        let mut expired = false;

        loop {
            tokio::select! {
                request = request_rx.recv() => {
                    let Some(request) = request else {
                        break;
                    };

                    if !self.serve(request).await {
                        continue;
                    }

                    expiry.as_mut().reset(deadline_after(self.config.ttl));
                    expired = false;

                    if !self.config.delay.is_zero() {
                        sleep(self.config.delay).await;
                    }
                }

                () = &mut expiry, if !expired => {
                    expired = true;

                    if self.conn.is_some() {
                        info!(ttl_ms = self.config.ttl.as_millis() as u64, "Closing idle connection");
                        self.close_connection().await;
                    }
                }
            }
        }

        self.close_connection().await;
        info!("Pool stopped");
    }

    /// Serves one request.
    ///
    /// Returns `true` when the work ran and the connection is still open,
    /// i.e. when the timer should be reset and the throttle applied.
    async fn serve(&mut self, request: Request<K::Conn>) -> bool {
        let Request { ctx, job } = request;

        if ctx.is_done() {
            trace!("Dropping request from caller that already gave up");
            return false;
        }

        let conn = match self.conn.take() {
            Some(conn) => {
                debug!("Reusing open connection");
                conn
            }
            None => match Self::open(&self.connector, &ctx).await {
                Ok(conn) => conn,
                Err(e) => {
                    job.fail(e);
                    return false;
                }
            },
        };

        let conn = self.conn.insert(conn);

        match job.run(conn).await {
            Disposition::Keep => true,
            Disposition::Discard { reason } => {
                warn!(%reason, "Closing connection after abnormal close");
                self.close_connection().await;
                false
            }
        }
    }

    /// Opens a new connection through the connector.
    async fn open(connector: &K, ctx: &Context) -> Result<K::Conn> {
        info!("Opening new connection");

        match connector.connect(ctx).await {
            Ok(conn) => {
                info!("Successfully opened new connection");
                Ok(conn)
            }
            Err(e) => {
                warn!(error = %e, "Failed to open new connection");
                Err(Error::connect_failed(e))
            }
        }
    }

    /// Tears down the connection, if any.
    async fn close_connection(&mut self) {
        if let Some(conn) = self.conn.take() {
            teardown(conn).await;
        }
    }
}

/// Extracts the message of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Returns `now + ttl`, saturating far in the future.
fn deadline_after(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl).unwrap_or(now + FAR_FUTURE)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32);

    fn bump_then_fail(c: &mut Counter) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            c.0 += 1;
            Err(Error::protocol("unexpected reply"))
        })
    }

    fn lose_transport(_: &mut Counter) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Err(Error::ConnectionClosed) })
    }

    fn answer_one(_: &mut Counter) -> BoxFuture<'_, Result<u8>> {
        Box::pin(async { Ok(1) })
    }

    fn explode(c: &mut Counter) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            c.0 += 1;
            if c.0 > 0 {
                panic!("boom");
            }
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_job_keeps_connection_on_ordinary_error() {
        let (tx, rx) = oneshot::channel();
        let job: Box<dyn Job<Counter>> = Box::new(Pending::new(bump_then_fail, tx));

        let mut conn = Counter(0);
        assert_eq!(job.run(&mut conn).await, Disposition::Keep);
        assert_eq!(conn.0, 1);
        assert!(matches!(rx.await, Ok(Err(Error::Protocol { .. }))));
    }

    #[tokio::test]
    async fn test_job_discards_on_abnormal_close() {
        let (tx, rx) = oneshot::channel();
        let job: Box<dyn Job<Counter>> = Box::new(Pending::new(lose_transport, tx));

        let disposition = job.run(&mut Counter(0)).await;
        assert!(matches!(disposition, Disposition::Discard { .. }));
        assert!(matches!(rx.await, Ok(Err(Error::ConnectionClosed))));
    }

    #[tokio::test]
    async fn test_job_tolerates_abandoned_response_slot() {
        let (tx, rx) = oneshot::channel();
        drop(rx);

        let job: Box<dyn Job<Counter>> = Box::new(Pending::new(answer_one, tx));
        assert_eq!(job.run(&mut Counter(0)).await, Disposition::Keep);
    }

    #[tokio::test]
    async fn test_job_discards_after_panic() {
        let (tx, rx) = oneshot::channel();
        let job: Box<dyn Job<Counter>> = Box::new(Pending::new(explode, tx));

        let disposition = job.run(&mut Counter(0)).await;
        assert!(matches!(disposition, Disposition::Discard { .. }));
        assert!(matches!(
            rx.await,
            Ok(Err(Error::WorkPanicked { message })) if message == "boom"
        ));
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u32), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_job_fail_routes_error() {
        let (tx, rx) = oneshot::channel();
        let job: Box<dyn Job<Counter>> = Box::new(Pending::new(answer_one, tx));

        job.fail(Error::connect_failed(Error::connection("refused")));
        assert!(matches!(rx.await, Ok(Err(Error::ConnectFailed { .. }))));
    }

    #[test]
    fn test_deadline_after_saturates() {
        let far = deadline_after(Duration::MAX);
        assert!(far > Instant::now());
    }
}
