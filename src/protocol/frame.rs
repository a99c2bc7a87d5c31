//! Command frames
//!
//! The top-level unit read off a connection, and typed access to command
//! arguments.

use std::io::BufRead;

use bytes::{Bytes, BytesMut};

use crate::error::{KvError, Result};
use super::codec::{encode_array, read_expression};
use super::expression::Expression;

/// One client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFrame {
    /// A bare scalar at the top level
    Simple(Expression),

    /// Verb followed by arguments
    Array(Vec<Expression>),
}

impl CommandFrame {
    /// Read the next frame from a stream
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self> {
        Ok(match read_expression(reader)? {
            Expression::Array(items) => CommandFrame::Array(items),
            other => CommandFrame::Simple(other),
        })
    }

    /// Build a command as an array of bulk strings
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        CommandFrame::Array(args.into_iter().map(Expression::bulk).collect())
    }

    /// The command verb, if the frame names one
    ///
    /// For an array this is element 0; a bare string scalar is its own verb.
    pub fn verb(&self) -> Option<&str> {
        match self {
            CommandFrame::Array(items) => items.first()?.as_str(),
            CommandFrame::Simple(expr @ (Expression::SimpleString(_) | Expression::BulkString(_))) => {
                expr.as_str()
            }
            CommandFrame::Simple(_) => None,
        }
    }

    /// Everything after the verb
    pub fn arguments(&self) -> Arguments<'_> {
        match self {
            CommandFrame::Array(items) if !items.is_empty() => Arguments::new(&items[1..]),
            _ => Arguments::new(&[]),
        }
    }

    /// An array frame with no elements
    pub fn is_empty(&self) -> bool {
        matches!(self, CommandFrame::Array(items) if items.is_empty())
    }

    /// Framing artifact that carries no request
    pub fn is_carriage_return(&self) -> bool {
        matches!(self, CommandFrame::Simple(Expression::CarriageReturn))
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            CommandFrame::Simple(expr) => expr.encode(buf),
            CommandFrame::Array(items) => encode_array(items, buf),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }
}

/// Positional command arguments with typed accessors
///
/// Accessors fail with `InvalidArgument` instead of assuming a variant.
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    items: &'a [Expression],
}

impl<'a> Arguments<'a> {
    pub fn new(items: &'a [Expression]) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Expression> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Expression> {
        self.items.iter()
    }

    /// Fail with `WrongArity` unless exactly `count` arguments were given
    pub fn expect_len(&self, command: &str, count: usize) -> Result<()> {
        if self.items.len() != count {
            return Err(KvError::WrongArity {
                command: command.to_string(),
            });
        }
        Ok(())
    }

    /// Argument as raw bytes
    pub fn bytes(&self, index: usize) -> Result<Bytes> {
        match self.require(index)? {
            Expression::BulkString(data) => Ok(data.clone()),
            Expression::SimpleString(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            other => Err(Self::wrong_type(index, "string", other)),
        }
    }

    /// Argument as UTF-8 text
    pub fn string(&self, index: usize) -> Result<&'a str> {
        let expr = self.require(index)?;
        match expr {
            Expression::BulkString(_) | Expression::SimpleString(_) => expr.as_str().ok_or_else(|| {
                KvError::InvalidArgument(format!("argument {} is not valid UTF-8", index))
            }),
            other => Err(Self::wrong_type(index, "string", other)),
        }
    }

    /// Argument as a signed integer, from an integer or a decimal string
    pub fn integer(&self, index: usize) -> Result<i64> {
        self.require(index)?.as_integer().ok_or_else(|| {
            KvError::InvalidArgument("value is not an integer or out of range".to_string())
        })
    }

    fn require(&self, index: usize) -> Result<&'a Expression> {
        self.items
            .get(index)
            .ok_or_else(|| KvError::InvalidArgument(format!("missing argument {}", index)))
    }

    fn wrong_type(index: usize, expected: &str, found: &Expression) -> KvError {
        KvError::InvalidArgument(format!(
            "argument {} must be a {}, got {}",
            index,
            expected,
            found.kind()
        ))
    }
}
