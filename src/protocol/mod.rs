//! Text protocol adapter
//!
//! Line-oriented input parsing and action formatting. The decision core never
//! sees raw text; it only consumes [`TurnInput`](crate::game::state::TurnInput)
//! and produces [`Action`](crate::game::state::Action) values.

pub mod input;
pub mod output;

pub use input::{MatchInit, TurnReader};
pub use output::{write_actions, Command};

/// Errors raised while reading the referee's input
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Input ended unexpectedly while reading {0}")]
    Truncated(&'static str),
    #[error("Expected {expected} fields in {context}, got {got}")]
    FieldCount {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Invalid integer {value:?} in {context}")]
    InvalidNumber { context: &'static str, value: String },
    #[error("Unknown {context} code {code}")]
    UnknownCode { context: &'static str, code: i32 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
