//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Fixed worker thread pool, one connection per worker at a time
//! - Requests routed through the shared Dispatcher

mod server;
mod connection;

pub use server::Server;
pub use connection::{serve, Connection};
