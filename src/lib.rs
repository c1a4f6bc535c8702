//! # EmberKV
//!
//! A minimal in-memory key-value store with:
//! - A self-describing, Redis-inspired wire protocol
//! - A fixed command table (GET, SET, DELETE, FLUSH, MGET, MSET)
//! - Thread-per-connection serving, bounded by a worker pool
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │            (acceptor + fixed worker pool)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one Connection per worker
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │   Connection loop:  read_value → execute → write_value      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Dispatcher                               │
//! │              (static command table)                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │     Store     │
//!               │   (RwLock)    │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod dispatcher;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use protocol::Value;
pub use store::Store;
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
