//! # himas-channels
//!
//! Messaging platform integrations for Himas.

pub mod telegram;
pub mod utils;
