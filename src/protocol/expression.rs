//! Wire expressions
//!
//! The value model of the protocol: scalars, bulk strings, arrays and their
//! null forms.

use std::fmt;

use bytes::{Bytes, BytesMut};

use super::codec;

// =============================================================================
// Tag Bytes
// =============================================================================

pub const SIMPLE_STRING: u8 = b'+';
pub const ERROR: u8 = b'-';
pub const INTEGER: u8 = b':';
pub const BULK_STRING: u8 = b'$';
pub const ARRAY: u8 = b'*';
pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// A single protocol value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// `+<text>\r\n`
    SimpleString(String),

    /// `-<text>\r\n`
    Error(String),

    /// `:<decimal>\r\n`
    Integer(i64),

    /// `$<len>\r\n<bytes>\r\n`
    BulkString(Bytes),

    /// `$-1\r\n`
    NullBulkString,

    /// `*<count>\r\n` followed by each element
    Array(Vec<Expression>),

    /// `*-1\r\n`
    NullArray,

    /// A stray `\r` where an expression was expected. Framing only.
    CarriageReturn,
}

impl Expression {
    pub fn simple(text: impl Into<String>) -> Self {
        Expression::SimpleString(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Expression::Error(message.into())
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Expression::BulkString(data.into())
    }

    /// `+OK`
    pub fn ok() -> Self {
        Expression::simple("OK")
    }

    /// Raw bytes of a string-like expression
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Expression::SimpleString(s) | Expression::Error(s) => Some(s.as_bytes()),
            Expression::BulkString(b) => Some(b),
            _ => None,
        }
    }

    /// Text of a string-like expression, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expression::SimpleString(s) | Expression::Error(s) => Some(s),
            Expression::BulkString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Integer value, also accepting a decimal string
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Expression::Integer(i) => Some(*i),
            other => other.as_str()?.parse().ok(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Expression::Error(_))
    }

    pub fn is_carriage_return(&self) -> bool {
        matches!(self, Expression::CarriageReturn)
    }

    /// Short name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::SimpleString(_) => "simple string",
            Expression::Error(_) => "error",
            Expression::Integer(_) => "integer",
            Expression::BulkString(_) => "bulk string",
            Expression::NullBulkString => "null bulk string",
            Expression::Array(_) => "array",
            Expression::NullArray => "null array",
            Expression::CarriageReturn => "carriage return",
        }
    }

    /// Serialize into `buf`
    pub fn encode(&self, buf: &mut BytesMut) {
        codec::encode(self, buf);
    }

    /// Serialize into a fresh buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::SimpleString(s) => write!(f, "String: {}", s),
            Expression::Error(s) => write!(f, "Error: {}", s),
            Expression::Integer(i) => write!(f, "Integer: {}", i),
            Expression::BulkString(b) => write!(f, "BulkString: {}", String::from_utf8_lossy(b)),
            Expression::NullBulkString => f.write_str("NullBulkString"),
            Expression::Array(items) => {
                write!(f, "Array: {}", items.len())?;
                for item in items {
                    write!(f, "\n{}", item)?;
                }
                Ok(())
            }
            Expression::NullArray => f.write_str("NullArray"),
            Expression::CarriageReturn => f.write_str("CR"),
        }
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Expression::bulk(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Expression::Integer(value)
    }
}
