//! Tests that run the novai binary.

pub mod chat_test;
pub mod common;
