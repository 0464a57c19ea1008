//! AstroIntel CLI Library
//!
//! Process-level glue around the retrieval core: configuration, canned
//! answers, and the async question answering pipeline.

pub mod assistant;
pub mod config;
pub mod error;
pub mod faq;

pub use assistant::{Answer, Assistant, Hit, FALLBACK_ANSWER};
pub use config::Settings;
pub use error::{CliError, CliResult};
