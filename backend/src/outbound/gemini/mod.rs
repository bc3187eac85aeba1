//! Gemini outbound adapter.
//!
//! A thin HTTP implementation of the `AiCompletionSource` port against the
//! Generative Language `generateContent` endpoint.

mod dto;
mod http_source;

pub use http_source::{
    DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL, GeminiHttpSource, GeminiSetupError,
};
