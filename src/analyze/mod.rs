// src/analyze/mod.rs
//! External enrichment clients: LLM summarization/classification and translation.

pub mod ai_adapter;
pub mod gemini;
pub mod translator;

// Re-export convenient types.
pub use crate::analyze::ai_adapter::{build_clients_from_config, EnrichmentClients};
