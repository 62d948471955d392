//! Pool facade.
//!
//! [`Pool`] is the public entry point. It starts the connection actor on
//! first use and forwards each call to it as a request.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::transport::Connector;

use super::actor::{ConnectionActor, Pending, Request};
use super::builder::PoolBuilder;
use super::config::PoolConfig;

// ============================================================================
// Constants
// ============================================================================

/// Requests that may wait in the queue before callers block on enqueue.
const REQUEST_QUEUE_CAPACITY: usize = 32;

// ============================================================================
// Pool
// ============================================================================

/// A single pooled connection shared by many concurrent callers.
///
/// Work submitted through [`Pool::submit`] runs one unit at a time against
/// the same connection, which is opened lazily, torn down after `ttl` of
/// idleness, and discarded after an abnormal close.
///
/// Share a pool between tasks with `Arc<Pool<K>>`. Dropping the last
/// reference stops the actor and closes the connection.
///
/// # Example
///
/// ```ignore
/// let pool = Pool::builder().build(connector)?;
///
/// let value = pool
///     .submit(&Context::new(), |conn| Box::pin(async move {
///         conn.ping().await
///     }))
///     .await?;
/// ```
pub struct Pool<K: Connector> {
    /// Opens new connections (shared with the actor).
    connector: Arc<K>,

    /// Timing settings.
    config: PoolConfig,

    /// Request queue sender, set once the actor has been started.
    request_tx: Mutex<Option<mpsc::Sender<Request<K::Conn>>>>,
}

// ============================================================================
// Pool - Constructor
// ============================================================================

impl Pool<crate::transport::WsConnector> {
    /// Creates a new pool builder.
    #[inline]
    #[must_use]
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }
}

impl<K: Connector> Pool<K> {
    /// Creates a pool around a connector.
    ///
    /// The actor is not started until the first call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` is invalid.
    pub fn new(connector: K, config: PoolConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            connector: Arc::new(connector),
            config,
            request_tx: Mutex::new(None),
        })
    }
}

// ============================================================================
// Pool - Public API
// ============================================================================

impl<K: Connector> Pool<K> {
    /// Returns the timing settings.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Returns the connector.
    #[inline]
    #[must_use]
    pub fn connector(&self) -> &K {
        &self.connector
    }

    /// Returns `true` once the actor has been started.
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.request_tx.lock().is_some()
    }

    /// Runs a unit of work against the pooled connection.
    ///
    /// Opens the connection first if there is none. Waits until the work
    /// has run or `ctx` is done, whichever comes first. A request whose
    /// caller already gave up by the time it is dequeued is dropped
    /// without running.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Cancellation and deadline of this call
    /// * `work` - Closure over the connection, e.g.
    ///   `|conn| Box::pin(async move { ... })`
    ///
    /// # Errors
    ///
    /// - The work's own error, unchanged
    /// - [`Error::ConnectFailed`] if the connection could not be opened
    /// - [`Error::Cancelled`] / [`Error::DeadlineExceeded`] if `ctx` is done first
    /// - [`Error::PoolClosed`] if the actor is gone
    pub async fn submit<T, F>(&self, ctx: &Context, work: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut K::Conn) -> BoxFuture<'c, Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let request_tx = self.start();

        let (response_tx, response_rx) = oneshot::channel();
        let request = Request {
            ctx: ctx.clone(),
            job: Box::new(Pending::new(work, response_tx)),
        };

        tokio::select! {
            sent = request_tx.send(request) => sent.map_err(|_| Error::PoolClosed)?,
            err = ctx.done() => return Err(err),
        }

        tokio::select! {
            response = response_rx => match response {
                Ok(result) => result,
                // The actor drops requests whose caller already gave up.
                Err(_) => Err(ctx.err().unwrap_or(Error::PoolClosed)),
            },
            err = ctx.done() => Err(err),
        }
    }

    /// Runs a unit of work with a deadline `timeout` from now.
    ///
    /// # Errors
    ///
    /// See [`Pool::submit`].
    pub async fn submit_with_timeout<T, F>(&self, timeout: Duration, work: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut K::Conn) -> BoxFuture<'c, Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(&Context::with_timeout(timeout), work).await
    }
}

// ============================================================================
// Pool - Lifecycle
// ============================================================================

impl<K: Connector> Pool<K> {
    /// Starts the actor on first use and returns the queue sender.
    ///
    /// Concurrent first callers serialize on the lock; exactly one spawns
    /// the actor and all of them get its sender. An actor that has exited
    /// (its task panicked outside a unit of work) is replaced.
    fn start(&self) -> mpsc::Sender<Request<K::Conn>> {
        let mut guard = self.request_tx.lock();

        match guard.as_ref() {
            Some(request_tx) if !request_tx.is_closed() => return request_tx.clone(),
            Some(_) => warn!("Pool actor exited, starting a new one"),
            None => {}
        }

        let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
        let actor = ConnectionActor::new(Arc::clone(&self.connector), self.config);
        tokio::spawn(actor.run(request_rx));

        info!(
            ttl_ms = self.config.ttl.as_millis() as u64,
            delay_ms = self.config.delay.as_millis() as u64,
            "Started pool"
        );

        *guard = Some(request_tx.clone());
        request_tx
    }
}

// ============================================================================
// Tests
// ============================================================================
