//! LLM extraction over crawled content
//!
//! This module provides:
//! - The normalized conversation history
//! - Prompt templates
//! - The extraction engine with its chunked, single-shot and conversational modes

mod engine;
mod history;
mod prompt;

pub use engine::{ExtractionEngine, ExtractionRequest, ExtractionResult};
pub use history::{ConversationHistory, Role, Turn};
pub use prompt::{chunk_input, construct_prompt, full_input, CONVERSATIONAL_INSTRUCTION};
