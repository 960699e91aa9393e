//! Binary-local application orchestration.
//!
//! `main.rs` only parses arguments and initializes logging; the chat command
//! is wired and run from here.

pub(crate) mod chat;
pub(crate) mod startup;
