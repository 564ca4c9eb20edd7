/*!
 * Script generation pipeline.
 *
 * This module contains the core machinery for turning a set of source files
 * into a narrated explanation script. It is split into several submodules:
 *
 * - `batch`: token estimation and batch planning
 * - `markdown`: lenient state-machine parser for Markdown provider output
 * - `json_adapter`: strict adapter for structured JSON provider output
 * - `retry`: single-flight retry orchestration around provider calls
 * - `prompt`: prompt templates for batches and the repository overview
 * - `assembler`: end-to-end assembly of the final script
 */

// Re-export main types for easier usage
pub use self::assembler::{AssemblerOptions, ProgressCallback, ScriptAssembler};
pub use self::batch::{Batch, BatchPlan, BatchPlanner, HeuristicTokenEstimator, TokenEstimator};
pub use self::json_adapter::{JsonScriptAdapter, extract_json_payload};
pub use self::markdown::MarkdownScriptParser;
pub use self::retry::{RetryOrchestrator, parse_reset_hint};

// Submodules
pub mod assembler;
pub mod batch;
pub mod json_adapter;
pub mod markdown;
pub mod prompt;
pub mod retry;
