//! Protocol Module
//!
//! Defines the text wire protocol for client-server communication.
//!
//! ## Expressions
//! ```text
//! ┌─────────┬───────────────────────────┬────────────────────┐
//! │ Tag (1) │ Header line               │ Body               │
//! ├─────────┼───────────────────────────┼────────────────────┤
//! │   +     │ text\r\n                  │ -                  │
//! │   -     │ text\r\n                  │ -                  │
//! │   :     │ decimal\r\n               │ -                  │
//! │   $     │ len\r\n  (-1 = null)      │ len bytes + \r\n   │
//! │   *     │ count\r\n (-1 = null)     │ count expressions  │
//! └─────────┴───────────────────────────┴────────────────────┘
//! ```
//!
//! ### Requests
//! Clients send an array of bulk strings: the verb, then its arguments.
//! `*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n` is `GET foo`.
//!
//! ### Responses
//! Any single expression. Failures are `-ERR <message>\r\n`.

mod codec;
mod expression;
mod frame;

pub use codec::{
    encode, read_expression, write_expression, MAX_ARRAY_LEN, MAX_BULK_LEN, MAX_DEPTH,
    MAX_LINE_LEN,
};
pub use expression::Expression;
pub use frame::{Arguments, CommandFrame};
