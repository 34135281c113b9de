// src/ai/mod.rs
//! Generative-AI integration: prompt construction, provider clients, and
//! the reply normalizer that turns free text into a structured mapping.

pub mod normalize;
pub mod prompt;
pub mod summarizer;

pub use normalize::{conform, normalize, normalize_text, SummarySchema};
pub use summarizer::{build_summarizer_from_config, DynSummarizer, MockSummarizer, Summarizer};
