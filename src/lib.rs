//! wspool - One shared connection, one caller at a time.
//!
//! This library keeps a single expensive connection (handshake, auth) alive
//! for many short request/response exchanges that must not interleave on
//! the same transport.
//!
//! # Architecture
//!
//! A [`Pool`] owns nothing but a queue. The first call spawns a connection
//! actor: one tokio task that exclusively owns the connection and serves
//! queued requests strictly one at a time.
//!
//! Key design principles:
//!
//! - The connection is opened lazily by a [`Connector`]
//! - It is torn down after `ttl` without use
//! - It is discarded after a unit of work reports an abnormal close
//! - Successive units of work are spaced at least `delay` apart
//! - No retries: a failed call fails, the next one gets a fresh connection
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use wspool::{Context, Pool, Result, WsConnector};
//! use wspool::websocket::exchange_text;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let pool = Pool::builder()
//!         .ttl(Duration::from_secs(30))
//!         .delay(Duration::from_millis(100))
//!         .build(WsConnector::new("ws://127.0.0.1:9000")?)?;
//!
//!     let reply = pool
//!         .submit(&Context::new(), |ws| Box::pin(exchange_text(ws, "ping")))
//!         .await?;
//!     println!("Reply: {}", reply);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pool`] | [`Pool`], builder and timing configuration |
//! | [`transport`] | [`Connector`] / [`Connection`] seams, WebSocket support |
//! | [`context`] | Cancellation and deadlines |
//! | [`error`] | Error types and [`Result`] alias |

// ============================================================================
// Modules
// ============================================================================

/// Cancellation and deadlines.
pub mod context;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Serialized single-connection pool.
///
/// Use [`Pool::builder()`] to create a configured pool.
pub mod pool;

/// Transport seams and the WebSocket transport.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Pool types
pub use pool::{Pool, PoolBuilder, PoolConfig};

// Transport types
pub use transport::{Connection, Connector, WsConnector, websocket};

// Context
pub use context::Context;

// Error types
pub use error::{Error, Result};
