//! Value definitions
//!
//! The single data type exchanged over the wire.

use std::fmt;

use bytes::Bytes;

/// A decoded (or to-be-encoded) protocol value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Simple strings: +OK\r\n
    SimpleString(String),

    /// Errors: -message\r\n
    Error(String),

    /// Integers: :1000\r\n
    Integer(i64),

    /// Bulk strings: $6\r\nfoobar\r\n
    BulkString(Bytes),

    /// Null bulk string: $-1\r\n
    Null,

    /// Arrays: *2\r\n...
    Array(Vec<Value>),

    /// Maps: %1\r\n<key><value>
    ///
    /// Pairs keep wire order; duplicate keys are preserved.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Create a bulk string from bytes
    pub fn bulk(b: impl Into<Bytes>) -> Self {
        Value::BulkString(b.into())
    }

    /// Create an error
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    /// Create an integer from a count
    pub fn count(n: usize) -> Self {
        Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }

    /// Check if this is the null bulk string
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to extract array elements
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Try to extract integer value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Byte view of a textual value (bulk or simple string)
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::BulkString(b) => Some(&b[..]),
            Value::SimpleString(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Short name of the variant, used in log and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::SimpleString(_) => "simple-string",
            Value::Error(_) => "error",
            Value::Integer(_) => "integer",
            Value::BulkString(_) => "bulk-string",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::BulkString(Bytes::from(b))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// redis-cli style rendering, used by the CLI
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::SimpleString(s) => write!(f, "{}", s),
            Value::Error(e) => write!(f, "(error) {}", e),
            Value::Integer(n) => write!(f, "(integer) {}", n),
            Value::BulkString(b) => write!(f, "\"{}\"", String::from_utf8_lossy(b).escape_debug()),
            Value::Null => write!(f, "(nil)"),
            Value::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
            Value::Map(pairs) if pairs.is_empty() => write!(f, "(empty map)"),
            Value::Map(pairs) => {
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}# {} => {}", i + 1, key, value)?;
                }
                Ok(())
            }
        }
    }
}
