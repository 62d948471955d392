//! Serialized single-connection pool.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   submit    ┌──────────┐   request queue   ┌─────────────────┐
//! │ caller 1 │────────────►│          │──────────────────►│ ConnectionActor │
//! │ caller 2 │────────────►│   Pool   │                   │  Option<Conn>   │
//! │ caller N │────────────►│          │◄──────────────────│  expiry timer   │
//! └──────────┘  result     └──────────┘  oneshot per call └─────────────────┘
//! ```
//!
//! Callers never touch the connection. They enqueue a request and wait on a
//! private response slot; the actor runs requests one at a time.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`Pool`] facade |
//! | `builder` | [`PoolBuilder`] |
//! | `config` | [`PoolConfig`] timing settings |
//! | `actor` | Connection actor event loop (internal) |

// ============================================================================
// Submodules
// ============================================================================

/// Connection actor event loop.
mod actor;

/// Builder pattern for pool configuration.
pub mod builder;

/// Pool timing configuration.
pub mod config;

/// Pool facade.
pub mod core;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::PoolBuilder;
pub use config::PoolConfig;
pub use core::Pool;
