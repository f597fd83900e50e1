//! Core pipeline orchestration and domain logic for edugen.
//!
//! This crate ties together generation, search enrichment, simplification,
//! readability scoring and persistence into one sequential run
//! ([`pipeline::Pipeline`]), and provides the standalone directory
//! analyzer ([`batch::analyze_directory`]).

pub mod batch;
pub mod persist;
pub mod pipeline;
pub mod prompts;

pub use batch::{BatchReport, FileAnalysis, FileFailure, MetricSummary, analyze_directory};
pub use pipeline::{Pipeline, PipelineConfig, PipelineResult, ProgressReporter, SilentProgress};
