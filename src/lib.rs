//! Repository analysis: languages, manifests, folder tree, heuristic scores and
//! a narrative that comes from a language model or a rule-based fallback.

pub mod analyzer;
pub mod classify;
pub mod config;
pub mod error;
pub mod languages;
pub mod manifests;
pub mod narrative;
pub mod ollama;
pub mod project_tree;
pub mod report;
pub mod scoring;
pub mod server;
pub mod snapshot;
pub mod text;

pub use analyzer::Analyzer;
pub use config::AnalyzerConfig;
pub use error::{AnalyzeError, NarrativeError};
pub use report::AnalysisReport;
