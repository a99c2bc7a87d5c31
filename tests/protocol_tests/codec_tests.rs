//! Codec Tests
//!
//! Tests for expression encoding/decoding.

use std::io::Cursor;

use bytes::{Bytes, BytesMut};
use kvcache::protocol::{
    encode, read_expression, write_expression, Expression, MAX_BULK_LEN, MAX_DEPTH,
};
use kvcache::KvError;

// =============================================================================
// Helper Functions
// =============================================================================

fn decode(input: &[u8]) -> kvcache::Result<Expression> {
    read_expression(&mut Cursor::new(input))
}

fn encoded(expr: &Expression) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode(expr, &mut buf);
    buf.to_vec()
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_scalars() {
    assert_eq!(encoded(&Expression::simple("OK")), b"+OK\r\n");
    assert_eq!(encoded(&Expression::error("ERR boom")), b"-ERR boom\r\n");
    assert_eq!(encoded(&Expression::Integer(-42)), b":-42\r\n");
    assert_eq!(encoded(&Expression::bulk("foobar")), b"$6\r\nfoobar\r\n");
    assert_eq!(encoded(&Expression::bulk("")), b"$0\r\n\r\n");
}

#[test]
fn test_encode_nulls() {
    assert_eq!(encoded(&Expression::NullBulkString), b"$-1\r\n");
    assert_eq!(encoded(&Expression::NullArray), b"*-1\r\n");
}

#[test]
fn test_encode_array() {
    let expr = Expression::Array(vec![
        Expression::bulk("GET"),
        Expression::bulk("foo"),
        Expression::Integer(1),
    ]);

    assert_eq!(encoded(&expr), b"*3\r\n$3\r\nGET\r\n$3\r\nfoo\r\n:1\r\n");
    assert_eq!(encoded(&Expression::Array(vec![])), b"*0\r\n");
}

#[test]
fn test_write_expression_flushes() {
    let mut out = Vec::new();
    write_expression(&mut out, &Expression::simple("PONG")).unwrap();
    assert_eq!(out, b"+PONG\r\n");
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_scalars() {
    assert_eq!(decode(b"+PONG\r\n").unwrap(), Expression::simple("PONG"));
    assert_eq!(decode(b"-ERR nope\r\n").unwrap(), Expression::error("ERR nope"));
    assert_eq!(decode(b":1000\r\n").unwrap(), Expression::Integer(1000));
    assert_eq!(decode(b"$5\r\nhello\r\n").unwrap(), Expression::bulk("hello"));
}

#[test]
fn test_decode_nulls() {
    assert_eq!(decode(b"$-1\r\n").unwrap(), Expression::NullBulkString);
    assert_eq!(decode(b"*-1\r\n").unwrap(), Expression::NullArray);
}

#[test]
fn test_decode_bulk_with_binary_payload() {
    let expr = decode(b"$4\r\na\r\nb\r\n").unwrap();
    assert_eq!(expr, Expression::BulkString(Bytes::from_static(b"a\r\nb")));
}

#[test]
fn test_decode_nested_array() {
    let expr = decode(b"*2\r\n*1\r\n:1\r\n$1\r\nx\r\n").unwrap();

    assert_eq!(
        expr,
        Expression::Array(vec![
            Expression::Array(vec![Expression::Integer(1)]),
            Expression::bulk("x"),
        ])
    );
}

#[test]
fn test_decode_array_skips_carriage_returns() {
    let expr = decode(b"*2\r\n$3\r\nGET\r\n\r\n$3\r\nfoo\r\n").unwrap();

    assert_eq!(
        expr,
        Expression::Array(vec![Expression::bulk("GET"), Expression::bulk("foo")])
    );
}

#[test]
fn test_decode_bare_carriage_return() {
    assert_eq!(decode(b"\r\n").unwrap(), Expression::CarriageReturn);
}

#[test]
fn test_decode_consecutive_expressions() {
    let mut reader = Cursor::new(&b"+OK\r\n:7\r\n$-1\r\n"[..]);

    assert_eq!(read_expression(&mut reader).unwrap(), Expression::ok());
    assert_eq!(read_expression(&mut reader).unwrap(), Expression::Integer(7));
    assert_eq!(read_expression(&mut reader).unwrap(), Expression::NullBulkString);
}

#[test]
fn test_roundtrip_reply_shapes() {
    let replies = [
        Expression::ok(),
        Expression::error("ERR Unknown command 'FOO'"),
        Expression::Integer(0),
        Expression::bulk("value"),
        Expression::NullBulkString,
        Expression::NullArray,
        Expression::Array(vec![Expression::bulk("a"), Expression::bulk("b")]),
        Expression::Array(vec![
            Expression::simple("OK"),
            Expression::Integer(-3),
            Expression::bulk("value"),
            Expression::error("ERR nope"),
        ]),
        Expression::Array(vec![]),
    ];

    for reply in replies {
        assert_eq!(decode(&encoded(&reply)).unwrap(), reply);
    }
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_unknown_tag_is_protocol_error() {
    assert!(matches!(decode(b"?what\r\n"), Err(KvError::Protocol(_))));
}

#[test]
fn test_bad_integer_is_protocol_error() {
    assert!(matches!(decode(b":12a\r\n"), Err(KvError::Protocol(_))));
    assert!(matches!(decode(b"$x\r\n"), Err(KvError::Protocol(_))));
}

#[test]
fn test_negative_length_is_protocol_error() {
    assert!(matches!(decode(b"$-2\r\n"), Err(KvError::Protocol(_))));
    assert!(matches!(decode(b"*-5\r\n"), Err(KvError::Protocol(_))));
}

#[test]
fn test_missing_bulk_terminator_is_desync() {
    assert!(matches!(decode(b"$3\r\nfooXY"), Err(KvError::Desync(_))));
}

#[test]
fn test_bad_array_element_is_desync() {
    let err = decode(b"*3\r\n$3\r\nSET\r\n?bad\r\n$1\r\nv\r\n").unwrap_err();
    assert!(matches!(err, KvError::Desync(_)), "{:?}", err);

    let err = decode(b"*2\r\n$3\r\nGET\r\n$1\r\nkX\r\n").unwrap_err();
    assert!(matches!(err, KvError::Desync(_)), "{:?}", err);
}

#[test]
fn test_oversized_bulk_is_desync() {
    let input = format!("${}\r\n", MAX_BULK_LEN + 1);
    assert!(matches!(decode(input.as_bytes()), Err(KvError::Desync(_))));
}

#[test]
fn test_too_deep_nesting_is_desync() {
    let input = "*1\r\n".repeat(MAX_DEPTH + 1);
    assert!(matches!(decode(input.as_bytes()), Err(KvError::Desync(_))));
}

#[test]
fn test_truncated_input_is_disconnect() {
    for input in [&b""[..], b"+OK", b"$5\r\nhel", b"*2\r\n:1\r\n"] {
        let err = decode(input).unwrap_err();
        assert!(err.is_disconnect(), "{:?} gave {:?}", input, err);
    }
}
