//! # himas-core
//!
//! Core types, traits, configuration, and error handling for Himas.

pub mod config;
pub mod error;
pub mod message;
pub mod traits;
