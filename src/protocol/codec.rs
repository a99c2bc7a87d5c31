//! Protocol codec
//!
//! Reading and writing expressions over a byte stream.
//!
//! ## Wire Format
//!
//! ```text
//! +OK\r\n                      simple string
//! -ERR message\r\n             error
//! :1000\r\n                    integer
//! $3\r\nbar\r\n                bulk string
//! $-1\r\n                      null bulk string
//! *2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n   array
//! *-1\r\n                      null array
//! ```
//!
//! Parsing reads one tag byte and dispatches on it; each variant then reads
//! the rest of its own encoding. A bare `\r` where an expression is expected
//! decodes as [`Expression::CarriageReturn`], which arrays skip without
//! counting it.
//!
//! Malformed input is a `Protocol` error only while nothing past the current
//! header line has been consumed. Once an array or bulk body is underway the
//! error is a `Desync`.

use std::io::{BufRead, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KvError, Result};
use super::expression::{Expression, ARRAY, BULK_STRING, CR, CRLF, ERROR, INTEGER, LF, SIMPLE_STRING};

/// Maximum bulk string length (16 MB)
pub const MAX_BULK_LEN: usize = 16 * 1024 * 1024;

/// Maximum number of array elements
pub const MAX_ARRAY_LEN: usize = 1024 * 1024;

/// Maximum length of a single header or simple line (64 KB)
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Maximum array nesting
pub const MAX_DEPTH: usize = 32;

// =============================================================================
// Decoding
// =============================================================================

/// Read one expression from a stream
///
/// Blocks until a complete expression is received or an error occurs.
/// End of stream surfaces as an `UnexpectedEof` I/O error.
pub fn read_expression<R: BufRead>(reader: &mut R) -> Result<Expression> {
    read_nested(reader, 0)
}

fn read_nested<R: BufRead>(reader: &mut R, depth: usize) -> Result<Expression> {
    let mut tag = [0u8; 1];
    reader.read_exact(&mut tag)?;

    match tag[0] {
        SIMPLE_STRING => Ok(Expression::SimpleString(read_text_line(reader)?)),
        ERROR => Ok(Expression::Error(read_text_line(reader)?)),
        INTEGER => {
            let line = read_line(reader)?;
            parse_decimal(&line).map(Expression::Integer)
        }
        BULK_STRING => read_bulk_string(reader),
        ARRAY => read_array(reader, depth),
        CR => {
            skip_lf(reader)?;
            Ok(Expression::CarriageReturn)
        }
        other => Err(KvError::Protocol(format!(
            "unexpected tag byte 0x{:02x}",
            other
        ))),
    }
}

/// `$<len>\r\n<bytes>\r\n`, or `$-1\r\n`
fn read_bulk_string<R: BufRead>(reader: &mut R) -> Result<Expression> {
    let len = match read_length(reader, MAX_BULK_LEN, "bulk string")? {
        Some(len) => len,
        None => return Ok(Expression::NullBulkString),
    };

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;

    // The body is already consumed, so a bad terminator leaves no known
    // boundary to resume from
    let mut terminator = [0u8; 2];
    reader.read_exact(&mut terminator)?;
    if terminator != CRLF {
        return Err(KvError::Desync(
            "bulk string not terminated by CRLF".to_string(),
        ));
    }

    Ok(Expression::BulkString(Bytes::from(data)))
}

/// `*<count>\r\n` then `count` expressions, or `*-1\r\n`
fn read_array<R: BufRead>(reader: &mut R, depth: usize) -> Result<Expression> {
    let count = match read_length(reader, MAX_ARRAY_LEN, "array")? {
        Some(count) => count,
        None => return Ok(Expression::NullArray),
    };
    if depth >= MAX_DEPTH {
        return Err(KvError::Desync(format!(
            "arrays nested deeper than {}",
            MAX_DEPTH
        )));
    }

    let mut items = Vec::with_capacity(count.min(1024));
    while items.len() < count {
        // Past the header the rest of the array is unread, so an element
        // error cannot be resynchronized
        let item = read_nested(reader, depth + 1).map_err(|e| match e {
            KvError::Protocol(message) => KvError::Desync(message),
            other => other,
        })?;
        if item.is_carriage_return() {
            continue;
        }
        items.push(item);
    }

    Ok(Expression::Array(items))
}

/// Parse a length header; `-1` means null
fn read_length<R: BufRead>(reader: &mut R, max: usize, what: &str) -> Result<Option<usize>> {
    let line = read_line(reader)?;
    let len = parse_decimal(&line)?;

    match len {
        -1 => Ok(None),
        len if len < 0 => Err(KvError::Protocol(format!(
            "invalid {} length {}",
            what, len
        ))),
        len if len as u64 > max as u64 => Err(KvError::Desync(format!(
            "{} length {} exceeds limit {}",
            what, len, max
        ))),
        len => Ok(Some(len as usize)),
    }
}

/// Read one line, without its `\n` or `\r\n` terminator
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    reader
        .by_ref()
        .take(MAX_LINE_LEN as u64)
        .read_until(LF, &mut line)?;

    if line.last() != Some(&LF) {
        if line.len() >= MAX_LINE_LEN {
            return Err(KvError::Desync(format!(
                "line exceeds {} bytes",
                MAX_LINE_LEN
            )));
        }
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }

    line.pop();
    if line.last() == Some(&CR) {
        line.pop();
    }
    Ok(line)
}

fn read_text_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let line = read_line(reader)?;
    String::from_utf8(line).map_err(|_| KvError::Protocol("line is not valid UTF-8".to_string()))
}

/// A `\r` marker swallows the `\n` right after it
fn skip_lf<R: BufRead>(reader: &mut R) -> Result<()> {
    let next = reader.fill_buf()?;
    if next.first() == Some(&LF) {
        reader.consume(1);
    }
    Ok(())
}

fn parse_decimal(line: &[u8]) -> Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            KvError::Protocol(format!(
                "invalid integer '{}'",
                String::from_utf8_lossy(line)
            ))
        })
}

// =============================================================================
// Encoding
// =============================================================================

/// Serialize an expression into `buf`
pub fn encode(expression: &Expression, buf: &mut BytesMut) {
    match expression {
        Expression::SimpleString(s) => encode_line(buf, SIMPLE_STRING, s.as_bytes()),
        Expression::Error(s) => encode_line(buf, ERROR, s.as_bytes()),
        Expression::Integer(i) => encode_line(buf, INTEGER, i.to_string().as_bytes()),
        Expression::BulkString(data) => {
            encode_line(buf, BULK_STRING, data.len().to_string().as_bytes());
            buf.put_slice(data);
            buf.put_slice(CRLF);
        }
        Expression::NullBulkString => encode_line(buf, BULK_STRING, b"-1"),
        Expression::Array(items) => encode_array(items, buf),
        Expression::NullArray => encode_line(buf, ARRAY, b"-1"),
        Expression::CarriageReturn => buf.put_u8(CR),
    }
}

/// `*<count>\r\n` followed by each element
pub fn encode_array(items: &[Expression], buf: &mut BytesMut) {
    encode_line(buf, ARRAY, items.len().to_string().as_bytes());
    for item in items {
        encode(item, buf);
    }
}

fn encode_line(buf: &mut BytesMut, tag: u8, body: &[u8]) {
    buf.reserve(body.len() + 3);
    buf.put_u8(tag);
    buf.put_slice(body);
    buf.put_slice(CRLF);
}

/// Write an expression to a stream and flush
pub fn write_expression<W: Write>(writer: &mut W, expression: &Expression) -> Result<()> {
    let mut buf = BytesMut::new();
    encode(expression, &mut buf);
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}
