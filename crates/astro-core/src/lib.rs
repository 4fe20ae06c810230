//! # astro-core
//!
//! Provider-agnostic text-completion abstraction shared by the astro-insight
//! services.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Analysis Pipeline                          │
//! │  ┌─────────────┐  ┌──────────────┐  ┌───────────────────┐   │
//! │  │   Prompt    │  │   Fallback   │  │ CompletionProvider │   │
//! │  │   Builder   │──│    Chain     │──│    (Strategy)      │   │
//! │  └─────────────┘  └──────────────┘  └───────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `CompletionProvider` trait enables swapping between OpenAI-compatible
//! backends (or test doubles) without changing any reading logic.

pub mod error;
pub mod message;
pub mod provider;

pub use error::{CoreError, Result};
pub use message::{Message, Role};
pub use provider::{Completion, CompletionProvider, GenerationOptions, TokenUsage};
