//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (Redis-inspired, self-describing)
//!
//! ### Type Tags
//! - `+` simple string
//! - `-` error
//! - `:` integer
//! - `$` bulk string (length-prefixed, `-1` = null)
//! - `*` array
//! - `%` map
//!
//! ### Requests
//! An array of strings, `*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n`, or a bare
//! simple string split on whitespace, `+GET key\r\n`.
//!
//! ### Responses
//! Any value. Command failures come back as `-<message>\r\n`.

mod value;
mod command;
mod codec;

pub use value::Value;
pub use command::Command;
pub use codec::{
    read_value, write_value, encode_value, decode_value,
    CRLF, MAX_AGGREGATE_LEN, MAX_BULK_LEN, MAX_DEPTH, MAX_LINE_LEN,
};
