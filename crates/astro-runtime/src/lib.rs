//! # astro-runtime
//!
//! Completion provider implementations for astro-insight.
//!
//! Currently ships a single provider targeting the OpenAI chat-completions
//! API (and anything wire-compatible with it). Providers implement
//! `astro_core::CompletionProvider`, so the analysis pipeline never depends
//! on a concrete backend.

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiProvider};
