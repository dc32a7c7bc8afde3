//! Utility modules shared across the assistant.

pub mod printer;
pub mod prompts;
pub mod season;
pub mod string_utils;
