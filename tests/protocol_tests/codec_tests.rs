//! Codec Tests
//!
//! Tests for value encoding/decoding and request normalization.

use std::io::{BufReader, Cursor, Read};

use bytes::Bytes;
use emberkv::protocol::{
    decode_value, encode_value, read_value, write_value,
    Command, Value, MAX_DEPTH,
};
use emberkv::KvError;

fn bulk(s: &[u8]) -> Value {
    Value::bulk(Bytes::copy_from_slice(s))
}

fn roundtrip(value: &Value) -> Value {
    let encoded = encode_value(value).unwrap();
    decode_value(&encoded).unwrap()
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_simple_string() {
    let decoded = decode_value(b"+hello world\r\n").unwrap();
    assert_eq!(decoded, Value::SimpleString("hello world".to_string()));
}

#[test]
fn test_decode_error() {
    let decoded = decode_value(b"-ERR something broke\r\n").unwrap();
    assert_eq!(decoded, Value::Error("ERR something broke".to_string()));
}

#[test]
fn test_decode_integer() {
    assert_eq!(decode_value(b":42\r\n").unwrap(), Value::Integer(42));
    assert_eq!(decode_value(b":-7\r\n").unwrap(), Value::Integer(-7));
    assert_eq!(
        decode_value(b":9223372036854775807\r\n").unwrap(),
        Value::Integer(i64::MAX)
    );
}

#[test]
fn test_decode_bulk_string() {
    let decoded = decode_value(b"$6\r\nfoobar\r\n").unwrap();
    assert_eq!(decoded, bulk(b"foobar"));
}

#[test]
fn test_decode_null_bulk_string() {
    assert_eq!(decode_value(b"$-1\r\n").unwrap(), Value::Null);
}

#[test]
fn test_decode_empty_bulk_string() {
    assert_eq!(decode_value(b"$0\r\n\r\n").unwrap(), bulk(b""));
}

#[test]
fn test_decode_bulk_string_keeps_trailing_crlf_bytes() {
    // Payload is "ab\r\n" followed by the terminator
    let decoded = decode_value(b"$4\r\nab\r\n\r\n").unwrap();
    assert_eq!(decoded, bulk(b"ab\r\n"));
}

#[test]
fn test_decode_bulk_string_whitespace_only() {
    let decoded = decode_value(b"$3\r\n \t \r\n").unwrap();
    assert_eq!(decoded, bulk(b" \t "));
}

#[test]
fn test_decode_array() {
    let decoded = decode_value(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n:5\r\n").unwrap();
    assert_eq!(
        decoded,
        Value::Array(vec![bulk(b"SET"), bulk(b"k"), Value::Integer(5)])
    );
}

#[test]
fn test_decode_empty_array() {
    assert_eq!(decode_value(b"*0\r\n").unwrap(), Value::Array(vec![]));
}

#[test]
fn test_decode_nested_array() {
    let decoded = decode_value(b"*2\r\n*1\r\n:1\r\n*0\r\n").unwrap();
    assert_eq!(
        decoded,
        Value::Array(vec![
            Value::Array(vec![Value::Integer(1)]),
            Value::Array(vec![]),
        ])
    );
}

#[test]
fn test_decode_map_pairs_in_order() {
    let decoded = decode_value(b"%2\r\n$1\r\na\r\n:1\r\n$1\r\nb\r\n:2\r\n").unwrap();
    assert_eq!(
        decoded,
        Value::Map(vec![
            (bulk(b"a"), Value::Integer(1)),
            (bulk(b"b"), Value::Integer(2)),
        ])
    );
}

#[test]
fn test_decode_map_keeps_duplicate_keys() {
    let decoded = decode_value(b"%2\r\n+k\r\n:1\r\n+k\r\n:2\r\n").unwrap();
    match decoded {
        Value::Map(pairs) => assert_eq!(pairs.len(), 2),
        other => panic!("Expected map, got {:?}", other),
    }
}

#[test]
fn test_decode_ignores_bytes_after_first_value() {
    let decoded = decode_value(b":1\r\n:2\r\n").unwrap();
    assert_eq!(decoded, Value::Integer(1));
}

// =============================================================================
// Decoding Error Tests
// =============================================================================

fn expect_protocol_error(bytes: &[u8]) -> String {
    match decode_value(bytes) {
        Err(KvError::Protocol(msg)) => msg,
        other => panic!("Expected protocol error for {:?}, got {:?}", bytes, other),
    }
}

#[test]
fn test_empty_stream_is_disconnect() {
    assert!(matches!(decode_value(b""), Err(KvError::Disconnect)));
}

#[test]
fn test_unknown_tag_is_bad_request() {
    let msg = expect_protocol_error(b"!oops\r\n");
    assert_eq!(msg, "bad request");
}

#[test]
fn test_non_numeric_integer() {
    let msg = expect_protocol_error(b":12abc\r\n");
    assert!(msg.contains("invalid integer"));
}

#[test]
fn test_negative_bulk_length() {
    let msg = expect_protocol_error(b"$-5\r\n");
    assert!(msg.contains("negative bulk length"));
}

#[test]
fn test_non_numeric_bulk_length() {
    let msg = expect_protocol_error(b"$abc\r\nabc\r\n");
    assert!(msg.contains("invalid bulk length"));
}

#[test]
fn test_non_numeric_array_count() {
    let msg = expect_protocol_error(b"*x\r\n");
    assert!(msg.contains("invalid array length"));
}

#[test]
fn test_negative_array_count() {
    expect_protocol_error(b"*-1\r\n");
}

#[test]
fn test_negative_map_count() {
    expect_protocol_error(b"%-2\r\n");
}

#[test]
fn test_bulk_string_missing_terminator() {
    let msg = expect_protocol_error(b"$3\r\nfooXY");
    assert!(msg.contains("not terminated by CRLF"));
}

#[test]
fn test_truncated_bulk_string() {
    let msg = expect_protocol_error(b"$10\r\nshort\r\n");
    assert!(msg.contains("unexpected end of stream"));
}

#[test]
fn test_truncated_header_line() {
    let msg = expect_protocol_error(b":123");
    assert!(msg.contains("unexpected end of stream"));
}

#[test]
fn test_missing_array_element_is_protocol_error() {
    // End of stream at a nested tag is not a clean disconnect
    let msg = expect_protocol_error(b"*2\r\n:1\r\n");
    assert!(msg.contains("unexpected end of stream"));
}

#[test]
fn test_bare_lf_line_rejected() {
    let msg = expect_protocol_error(b":1\n");
    assert!(msg.contains("CRLF"));
}

#[test]
fn test_invalid_utf8_simple_string() {
    let msg = expect_protocol_error(b"+\xff\xfe\r\n");
    assert!(msg.contains("UTF-8"));
}

#[test]
fn test_overlong_line_rejected() {
    let mut bytes = vec![b':'];
    bytes.extend(std::iter::repeat(b'1').take(emberkv::protocol::MAX_LINE_LEN + 10));
    bytes.extend_from_slice(b"\r\n");
    let msg = expect_protocol_error(&bytes);
    assert!(msg.contains("line longer than"));
}

#[test]
fn test_oversized_bulk_length_rejected() {
    let msg = expect_protocol_error(b"$99999999999\r\n");
    assert!(msg.contains("too large"));
}

#[test]
fn test_nesting_limit() {
    let mut bytes = Vec::new();
    for _ in 0..(MAX_DEPTH + 2) {
        bytes.extend_from_slice(b"*1\r\n");
    }
    bytes.extend_from_slice(b":1\r\n");
    let msg = expect_protocol_error(&bytes);
    assert!(msg.contains("nesting"));
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_wire_format_bulk_string() {
    let encoded = encode_value(&bulk(b"hi")).unwrap();
    assert_eq!(&encoded[..], b"$2\r\nhi\r\n");
}

#[test]
fn test_wire_format_simple_string_encodes_as_bulk() {
    let encoded = encode_value(&Value::SimpleString("OK".to_string())).unwrap();
    assert_eq!(&encoded[..], b"$2\r\nOK\r\n");
}

#[test]
fn test_wire_format_integer() {
    assert_eq!(&encode_value(&Value::Integer(-12)).unwrap()[..], b":-12\r\n");
}

#[test]
fn test_wire_format_error() {
    let encoded = encode_value(&Value::error("unrecognized command: FOO")).unwrap();
    assert_eq!(&encoded[..], b"-unrecognized command: FOO\r\n");
}

#[test]
fn test_wire_format_null() {
    assert_eq!(&encode_value(&Value::Null).unwrap()[..], b"$-1\r\n");
}

#[test]
fn test_wire_format_array() {
    let value = Value::Array(vec![Value::Integer(1), bulk(b"a"), Value::Null]);
    let encoded = encode_value(&value).unwrap();
    assert_eq!(&encoded[..], b"*3\r\n:1\r\n$1\r\na\r\n$-1\r\n");
}

#[test]
fn test_wire_format_map() {
    let value = Value::Map(vec![(bulk(b"k"), Value::Integer(7))]);
    let encoded = encode_value(&value).unwrap();
    assert_eq!(&encoded[..], b"%1\r\n$1\r\nk\r\n:7\r\n");
}

#[test]
fn test_encode_error_with_newline_fails() {
    let result = encode_value(&Value::error("line one\r\nline two"));
    assert!(matches!(result, Err(KvError::Serialization(_))));
}

#[test]
fn test_encode_nested_unencodable_fails() {
    let value = Value::Array(vec![Value::Integer(1), Value::error("bad\n")]);
    assert!(matches!(encode_value(&value), Err(KvError::Serialization(_))));
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[test]
fn test_roundtrip_binary_payload() {
    let payload: Vec<u8> = (0..=255).collect();
    let value = Value::BulkString(Bytes::from(payload));
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn test_roundtrip_payload_ending_in_crlf() {
    let value = bulk(b"data\r\n\r\n");
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn test_roundtrip_mixed_tree() {
    let value = Value::Array(vec![
        Value::Integer(i64::MIN),
        Value::Null,
        bulk(b""),
        Value::Map(vec![
            (bulk(b"nested"), Value::Array(vec![bulk(b"x"), Value::Integer(0)])),
            (Value::Integer(3), Value::Map(vec![])),
        ]),
        Value::error("ERR kept"),
    ]);
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn test_simple_string_roundtrips_as_bulk() {
    let value = Value::SimpleString("text".to_string());
    assert_eq!(roundtrip(&value), bulk(b"text"));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_multiple_values() {
    let values = vec![
        Value::Array(vec![bulk(b"GET"), bulk(b"k")]),
        Value::Integer(10),
        Value::Null,
        bulk(b"multi\r\nline"),
    ];

    let mut buffer = Vec::new();
    for value in &values {
        write_value(&mut buffer, value).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &values {
        assert_eq!(&read_value(&mut cursor).unwrap(), expected);
    }
    assert!(matches!(read_value(&mut cursor), Err(KvError::Disconnect)));
}

/// Reader that hands out one byte per call
struct Trickle<'a>(&'a [u8]);

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.0.is_empty() || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.0[0];
        self.0 = &self.0[1..];
        Ok(1)
    }
}

#[test]
fn test_stream_fragmented_input() {
    let bytes = b"*2\r\n$3\r\nGET\r\n$5\r\nk\r\ney\r\n";
    let mut reader = BufReader::with_capacity(1, Trickle(bytes));
    let decoded = read_value(&mut reader).unwrap();
    assert_eq!(decoded, Value::Array(vec![bulk(b"GET"), bulk(b"k\r\ney")]));
}

// =============================================================================
// Command Normalization Tests
// =============================================================================

#[test]
fn test_command_from_array_uppercases_name() {
    let cmd = Command::from_value(Value::Array(vec![bulk(b"get"), bulk(b"key")])).unwrap();
    assert_eq!(cmd.name, "GET");
    assert_eq!(cmd.args, vec![bulk(b"key")]);
}

#[test]
fn test_command_from_simple_string_splits_whitespace() {
    let cmd = Command::from_value(Value::SimpleString("set  a\t1".to_string())).unwrap();
    assert_eq!(cmd.name, "SET");
    assert_eq!(cmd.args, vec![bulk(b"a"), bulk(b"1")]);
}

#[test]
fn test_command_empty_is_missing_command() {
    let err = Command::from_value(Value::Array(vec![])).unwrap_err();
    assert_eq!(err.to_string(), "Missing command");

    let err = Command::from_value(Value::SimpleString("   ".to_string())).unwrap_err();
    assert_eq!(err.to_string(), "Missing command");
}

#[test]
fn test_command_from_integer_rejected() {
    let err = Command::from_value(Value::Integer(5)).unwrap_err();
    assert!(matches!(err, KvError::Command(_)));
}
