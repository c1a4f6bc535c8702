//! Command definitions
//!
//! Turns a decoded request value into a command name plus arguments.

use bytes::Bytes;

use crate::error::{KvError, Result};
use super::Value;

/// A normalized request
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Upper-cased command name
    pub name: String,

    /// Positional arguments, in request order
    pub args: Vec<Value>,
}

impl Command {
    /// Normalize a decoded request
    ///
    /// Arrays are taken element-wise. A bare simple or bulk string is split
    /// on ASCII whitespace, so `+GET key\r\n` works from a telnet session.
    pub fn from_value(request: Value) -> Result<Self> {
        let mut tokens = match request {
            Value::Array(items) => items,
            Value::SimpleString(s) => split_tokens(s.as_bytes()),
            Value::BulkString(b) => split_tokens(&b),
            _ => {
                return Err(KvError::command(
                    "Request must be list or simple string.",
                ))
            }
        };

        if tokens.is_empty() {
            return Err(KvError::command("Missing command"));
        }

        let first = tokens.remove(0);
        let name = match &first {
            Value::Integer(n) => n.to_string(),
            other => match other.as_bytes() {
                Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                None => {
                    return Err(KvError::command(format!(
                        "invalid command name: expected string, got {}",
                        other.kind()
                    )))
                }
            },
        };

        Ok(Command {
            name: name.to_uppercase(),
            args: tokens,
        })
    }
}

fn split_tokens(text: &[u8]) -> Vec<Value> {
    text.split(|b| b.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| Value::bulk(Bytes::copy_from_slice(token)))
        .collect()
}
