//! LLM provider implementations.
//!
//! Each provider implements the [`BaseLLM`](crate::llms::base_llm::BaseLLM)
//! trait and handles authentication, request formatting and error mapping
//! specific to that provider.
//!
//! | Provider | Module |
//! |----------|--------|
//! | Google Gemini / Gemma | [`gemini`] |

pub mod gemini;
