//! Store Module
//!
//! In-memory key-value mapping shared by every connection.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Each operation is atomic (one lock acquisition per call)
//! - Agnostic to value shape: stores whatever `Value` a command supplies
//!
//! ## Data Structure Choice
//! HashMap wrapped in a parking_lot RwLock:
//! - No ordering requirement (nothing is ever flushed to disk)
//! - Readers (GET/MGET) proceed in parallel, writers are exclusive
//! - Multi-key commands use `get_many` / `set_many` so they stay atomic

mod table;

pub use table::Store;

/// Keys are raw byte strings
pub type Key = Vec<u8>;
