//! Shared types, error model, and configuration for edugen.
//!
//! This crate is the foundation depended on by all other edugen crates.
//! It provides:
//! - [`EdugenError`], the unified error type
//! - Domain types ([`ContentRequest`], [`SearchResult`], [`SimplifiedContent`], [`ReadabilityReport`])
//! - Configuration ([`AppConfig`], [`Secrets`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GenerationConfig, SearchConfig, Secrets, SimplificationConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, resolve_secrets,
    resolve_secrets_with,
};
pub use error::{EdugenError, Result};
pub use types::{
    ContentRequest, Metric, PipelineStage, ReadabilityReport, RunId, RunMetadata, SearchResult,
    SearchStatus, Section, SimplifiedContent, SimplifiedDraft, TextStats,
};
