//! # himas-providers
//!
//! Language-model provider implementations for Himas.

pub mod fallback;
pub mod ollama;
