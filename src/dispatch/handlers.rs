//! Built-in command handlers

use std::time::Duration;

use crate::error::{KvError, Result};
use crate::protocol::{Arguments, Expression};

use super::{Context, Handler, DBSIZE, DEL, EXPIRE, GET, KEYS, SET, TTL};

/// `PING` → `+PONG`; arguments are ignored
pub struct PingHandler;

impl Handler for PingHandler {
    fn handle(&self, _ctx: &Context, _args: &Arguments<'_>) -> Result<Expression> {
        Ok(Expression::simple("PONG"))
    }
}

/// `GET key` → bulk string, or null bulk string when missing
pub struct GetHandler;

impl Handler for GetHandler {
    fn handle(&self, ctx: &Context, args: &Arguments<'_>) -> Result<Expression> {
        args.expect_len(GET, 1)?;
        let key = args.bytes(0)?;

        Ok(match ctx.store().get(key)? {
            Some(value) => Expression::BulkString(value),
            None => Expression::NullBulkString,
        })
    }
}

/// `SET key value` → `+OK`
pub struct SetHandler;

impl Handler for SetHandler {
    fn handle(&self, ctx: &Context, args: &Arguments<'_>) -> Result<Expression> {
        args.expect_len(SET, 2)?;
        ctx.store().set(args.bytes(0)?, args.bytes(1)?)?;
        Ok(Expression::ok())
    }
}

/// `EXPIRE key seconds` → `:1`
///
/// Zero seconds removes the key's expiry.
pub struct ExpireHandler;

impl Handler for ExpireHandler {
    fn handle(&self, ctx: &Context, args: &Arguments<'_>) -> Result<Expression> {
        args.expect_len(EXPIRE, 2)?;
        let key = args.bytes(0)?;
        let seconds = u64::try_from(args.integer(1)?).map_err(|_| {
            KvError::InvalidArgument("invalid expire time in 'EXPIRE' command".to_string())
        })?;

        ctx.store().expire_key(key, Duration::from_secs(seconds))?;
        Ok(Expression::Integer(1))
    }
}

/// `DEL key` → `:1`
pub struct DelHandler;

impl Handler for DelHandler {
    fn handle(&self, ctx: &Context, args: &Arguments<'_>) -> Result<Expression> {
        args.expect_len(DEL, 1)?;
        ctx.store().delete(args.bytes(0)?)?;
        Ok(Expression::Integer(1))
    }
}

/// `TTL key` → configured TTL in whole seconds, `:0` when none
pub struct TtlHandler;

impl Handler for TtlHandler {
    fn handle(&self, ctx: &Context, args: &Arguments<'_>) -> Result<Expression> {
        args.expect_len(TTL, 1)?;
        let ttl = ctx.store().ttl_key(args.bytes(0)?)?;
        Ok(Expression::Integer(ttl.as_secs() as i64))
    }
}

/// `DBSIZE` → number of live keys
pub struct DbSizeHandler;

impl Handler for DbSizeHandler {
    fn handle(&self, ctx: &Context, args: &Arguments<'_>) -> Result<Expression> {
        args.expect_len(DBSIZE, 0)?;
        Ok(Expression::Integer(ctx.store().len()? as i64))
    }
}

/// `KEYS [*]` → array of every live key
///
/// Only the match-all pattern is understood.
pub struct KeysHandler;

impl Handler for KeysHandler {
    fn handle(&self, ctx: &Context, args: &Arguments<'_>) -> Result<Expression> {
        match args.len() {
            0 => {}
            1 if args.string(0)? == "*" => {}
            1 => {
                return Err(KvError::InvalidArgument(
                    "only the '*' pattern is supported".to_string(),
                ))
            }
            _ => {
                return Err(KvError::WrongArity {
                    command: KEYS.to_string(),
                })
            }
        }

        let mut keys = ctx.store().keys()?;
        keys.sort_unstable();
        Ok(Expression::Array(
            keys.into_iter().map(Expression::BulkString).collect(),
        ))
    }
}
