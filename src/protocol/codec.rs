//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Every value starts with a one-byte tag. Header lines end with CRLF.
//!
//! ```text
//! +<text>\r\n                 simple string
//! -<message>\r\n              error
//! :<i64>\r\n                  integer
//! $<len>\r\n<bytes>\r\n       bulk string ($-1\r\n is null)
//! *<count>\r\n<value>...      array
//! %<count>\r\n<key><value>... map (count pairs)
//! ```

use std::io::{BufRead, ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KvError, Result};
use super::Value;

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Maximum length of a header line, excluding CRLF (64 KB)
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Maximum bulk string payload (512 MB)
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Maximum element count of an array, or pair count of a map
pub const MAX_AGGREGATE_LEN: usize = 1024 * 1024;

/// Maximum nesting of arrays and maps
pub const MAX_DEPTH: usize = 512;

/// Upper bound on up-front allocation for aggregates; a declared count only
/// reserves this much until the elements actually arrive.
const PREALLOC_LIMIT: usize = 1024;

/// Same bound for bulk payloads, in bytes (64 KB)
const PREALLOC_BULK_LIMIT: usize = 64 * 1024;

// =============================================================================
// Decoding
// =============================================================================

/// Read one complete value from a stream
///
/// Blocks until a complete value is received or an error occurs.
/// End-of-stream before the tag byte yields `KvError::Disconnect`;
/// end-of-stream anywhere inside the value is a protocol error.
pub fn read_value<R: BufRead>(reader: &mut R) -> Result<Value> {
    match read_tag(reader)? {
        Some(tag) => read_tagged(reader, tag, 0),
        None => Err(KvError::Disconnect),
    }
}

/// Decode a single value from a byte slice
///
/// Bytes after the first complete value are ignored.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    let mut reader = bytes;
    read_value(&mut reader)
}

fn read_nested<R: BufRead>(reader: &mut R, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(KvError::Protocol(format!(
            "nesting deeper than {} levels",
            MAX_DEPTH
        )));
    }
    match read_tag(reader)? {
        Some(tag) => read_tagged(reader, tag, depth),
        None => Err(truncated()),
    }
}

fn read_tag<R: BufRead>(reader: &mut R) -> Result<Option<u8>> {
    let mut tag = [0u8; 1];
    loop {
        match reader.read(&mut tag) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(tag[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn read_tagged<R: BufRead>(reader: &mut R, tag: u8, depth: usize) -> Result<Value> {
    match tag {
        b'+' => Ok(Value::SimpleString(read_text(reader)?)),
        b'-' => Ok(Value::Error(read_text(reader)?)),
        b':' => Ok(Value::Integer(read_number(reader, "integer")?)),
        b'$' => read_bulk_string(reader),
        b'*' => read_array(reader, depth),
        b'%' => read_map(reader, depth),
        _ => Err(KvError::protocol("bad request")),
    }
}

/// Read `$<len>\r\n<bytes>\r\n` (tag already consumed)
///
/// The payload is taken by length, so CR/LF bytes inside it are data.
fn read_bulk_string<R: BufRead>(reader: &mut R) -> Result<Value> {
    let len = read_number(reader, "bulk length")?;
    if len == -1 {
        return Ok(Value::Null);
    }
    let len = checked_len(len, MAX_BULK_LEN, "bulk length")?;

    // Grow with the bytes that actually arrive, not the declared length
    let mut payload = Vec::with_capacity(len.min(PREALLOC_BULK_LIMIT));
    reader.by_ref().take(len as u64).read_to_end(&mut payload)?;
    if payload.len() != len {
        return Err(truncated());
    }

    let mut terminator = [0u8; 2];
    read_exact(reader, &mut terminator)?;
    if &terminator[..] != CRLF {
        return Err(KvError::protocol("bulk string not terminated by CRLF"));
    }

    Ok(Value::BulkString(Bytes::from(payload)))
}

fn read_array<R: BufRead>(reader: &mut R, depth: usize) -> Result<Value> {
    let count = read_number(reader, "array length")?;
    let count = checked_len(count, MAX_AGGREGATE_LEN, "array length")?;

    let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        items.push(read_nested(reader, depth + 1)?);
    }
    Ok(Value::Array(items))
}

fn read_map<R: BufRead>(reader: &mut R, depth: usize) -> Result<Value> {
    let count = read_number(reader, "map length")?;
    let count = checked_len(count, MAX_AGGREGATE_LEN, "map length")?;

    let mut pairs = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        let key = read_nested(reader, depth + 1)?;
        let value = read_nested(reader, depth + 1)?;
        pairs.push((key, value));
    }
    Ok(Value::Map(pairs))
}

/// Read a header line, returning it without the CRLF
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let limit = (MAX_LINE_LEN + CRLF.len()) as u64;
    reader.by_ref().take(limit).read_until(b'\n', &mut line)?;

    if !line.ends_with(b"\n") {
        if line.len() as u64 >= limit {
            return Err(KvError::Protocol(format!(
                "line longer than {} bytes",
                MAX_LINE_LEN
            )));
        }
        return Err(truncated());
    }
    if !line.ends_with(CRLF) {
        return Err(KvError::protocol("line not terminated by CRLF"));
    }

    line.truncate(line.len() - CRLF.len());
    Ok(line)
}

fn read_text<R: BufRead>(reader: &mut R) -> Result<String> {
    String::from_utf8(read_line(reader)?)
        .map_err(|_| KvError::protocol("invalid UTF-8 in line"))
}

fn read_number<R: BufRead>(reader: &mut R, what: &str) -> Result<i64> {
    let line = read_line(reader)?;
    std::str::from_utf8(&line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            KvError::Protocol(format!(
                "invalid {}: {:?}",
                what,
                String::from_utf8_lossy(&line)
            ))
        })
}

fn checked_len(n: i64, max: usize, what: &str) -> Result<usize> {
    let len = usize::try_from(n)
        .map_err(|_| KvError::Protocol(format!("negative {}: {}", what, n)))?;
    if len > max {
        return Err(KvError::Protocol(format!(
            "{} too large: {} (max {})",
            what, len, max
        )));
    }
    Ok(len)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            truncated()
        } else {
            KvError::Io(e)
        }
    })
}

fn truncated() -> KvError {
    KvError::protocol("unexpected end of stream")
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a value to bytes
///
/// Simple strings go out as bulk strings. Fails with
/// `KvError::Serialization` if the value cannot be represented on the wire.
pub fn encode_value(value: &Value) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(64);
    encode_into(&mut buf, value)?;
    Ok(buf.freeze())
}

/// Write a value to a stream
///
/// The value is fully encoded before anything is written, and the writer is
/// flushed before returning.
pub fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    let bytes = encode_value(value)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

fn encode_into(buf: &mut BytesMut, value: &Value) -> Result<()> {
    match value {
        Value::SimpleString(s) => put_bulk(buf, s.as_bytes()),
        Value::BulkString(b) => put_bulk(buf, b),
        Value::Integer(n) => {
            buf.put_u8(b':');
            buf.put_slice(n.to_string().as_bytes());
            buf.put_slice(CRLF);
        }
        Value::Error(message) => {
            if message.contains(['\r', '\n']) {
                return Err(KvError::Serialization(format!(
                    "error message of {} bytes contains CR or LF",
                    message.len()
                )));
            }
            buf.put_u8(b'-');
            buf.put_slice(message.as_bytes());
            buf.put_slice(CRLF);
        }
        Value::Null => buf.put_slice(b"$-1\r\n"),
        Value::Array(items) => {
            put_header(buf, b'*', items.len());
            for item in items {
                encode_into(buf, item)?;
            }
        }
        Value::Map(pairs) => {
            put_header(buf, b'%', pairs.len());
            for (key, value) in pairs {
                encode_into(buf, key)?;
                encode_into(buf, value)?;
            }
        }
    }
    Ok(())
}

fn put_header(buf: &mut BytesMut, tag: u8, len: usize) {
    buf.put_u8(tag);
    buf.put_slice(len.to_string().as_bytes());
    buf.put_slice(CRLF);
}

fn put_bulk(buf: &mut BytesMut, payload: &[u8]) {
    put_header(buf, b'$', payload.len());
    buf.reserve(payload.len() + CRLF.len());
    buf.put_slice(payload);
    buf.put_slice(CRLF);
}
