//! Dispatch Module
//!
//! Maps a command verb to its handler.
//!
//! Verb lookup is an exact, case-sensitive match. Handler failures and
//! lookup misses become `-ERR` replies; nothing here closes a connection.

mod handlers;

pub use handlers::{
    DbSizeHandler, DelHandler, ExpireHandler, GetHandler, KeysHandler, PingHandler, SetHandler,
    TtlHandler,
};

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::{Arguments, CommandFrame, Expression};
use crate::store::Store;

// =============================================================================
// Verbs
// =============================================================================

pub const PING: &str = "PING";
pub const GET: &str = "GET";
pub const SET: &str = "SET";
pub const EXPIRE: &str = "EXPIRE";
pub const DEL: &str = "DEL";
pub const TTL: &str = "TTL";
pub const DBSIZE: &str = "DBSIZE";
pub const KEYS: &str = "KEYS";

/// The store served over the wire: binary keys and values
pub type CacheStore = Store<Bytes, Bytes>;

/// State handed to every handler
#[derive(Clone)]
pub struct Context {
    store: CacheStore,
}

impl Context {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }
}

/// A command implementation
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &Context, args: &Arguments<'_>) -> Result<Expression>;
}

/// Verb → handler table
#[derive(Default)]
pub struct DispatchTable {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl DispatchTable {
    /// Table with every built-in command
    pub fn new() -> Self {
        let mut table = Self::default();
        table.register(PING, PingHandler);
        table.register(GET, GetHandler);
        table.register(SET, SetHandler);
        table.register(EXPIRE, ExpireHandler);
        table.register(DEL, DelHandler);
        table.register(TTL, TtlHandler);
        table.register(DBSIZE, DbSizeHandler);
        table.register(KEYS, KeysHandler);
        table
    }

    /// Add or replace the handler for `verb`
    pub fn register(&mut self, verb: impl Into<String>, handler: impl Handler + 'static) {
        self.handlers.insert(verb.into(), Box::new(handler));
    }

    pub fn get(&self, verb: &str) -> Option<&dyn Handler> {
        self.handlers.get(verb).map(|h| h.as_ref())
    }

    pub fn contains(&self, verb: &str) -> bool {
        self.handlers.contains_key(verb)
    }

    /// Registered verbs, sorted
    pub fn verbs(&self) -> Vec<&str> {
        let mut verbs: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        verbs.sort_unstable();
        verbs
    }

    /// Run one frame and produce its reply
    pub fn dispatch(&self, ctx: &Context, frame: &CommandFrame) -> Expression {
        if frame.is_empty() {
            return Expression::error("ERR No command provided");
        }

        let Some((verb, handler)) = frame
            .verb()
            .and_then(|verb| self.get(verb).map(|handler| (verb, handler)))
        else {
            let verb = frame.verb().unwrap_or_default();
            return Expression::error(format!("ERR Unknown command '{}'", verb));
        };

        match handler.handle(ctx, &frame.arguments()) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!("{} failed: {}", verb, e);
                Expression::error(format!("ERR {}", e))
            }
        }
    }
}
