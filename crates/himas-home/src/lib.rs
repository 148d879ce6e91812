//! # himas-home
//!
//! Turns free-text instructions ("kitchen light off, bedroom lamp red 80%")
//! into Home Assistant service calls and state reads.
//!
//! Pipeline per sub-command: [`split`] → [`patterns`] (fast path) or
//! [`llm`] (fallback) → [`resolve`] → [`executor`] → [`format`], driven by
//! [`interpreter::HomeInterpreter`] with one parse-and-execute retry.

pub mod aliases;
pub mod client;
pub mod color;
pub mod command;
pub mod directory;
pub mod entity;
pub mod error;
pub mod executor;
pub mod format;
pub mod interpreter;
pub mod llm;
pub mod patterns;
pub mod resolve;
pub mod split;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{Action, Command, Parameters};
pub use interpreter::HomeInterpreter;
