/*!
 * # Codecast - Code Explanation Script Generator
 *
 * A Rust library for turning source code into narrated explanation scripts
 * using AI.
 *
 * ## Features
 *
 * - Fetch source files from GitHub (single files or whole trees) or the
 *   local filesystem
 * - Generate scene-by-scene explanation scripts using various AI providers:
 *   - OpenAI API (and OpenAI-compatible servers)
 *   - Anthropic API
 * - Token-budgeted batching so arbitrarily large codebases fit provider
 *   context windows
 * - Markdown and strict JSON response formats, with graceful fallback
 * - Single-flight retry orchestration with rate-limit reset hints
 * - Configurable reader proficiency and explanation depth
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `script`: Scene and script data model, Markdown rendering
 * - `fetch`: GitHub and local source file acquisition
 * - `generation`: The script generation pipeline:
 *   - `generation::batch`: Token estimation and batch planning
 *   - `generation::markdown`: Lenient Markdown output parser
 *   - `generation::json_adapter`: Strict JSON output adapter
 *   - `generation::retry`: Retry orchestration around provider calls
 *   - `generation::assembler`: End-to-end script assembly
 * - `registry`: In-memory store of generated scripts
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `providers`: Client implementations for various LLM providers:
 *   - `providers::openai`: OpenAI API client
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod fetch;
pub mod file_utils;
pub mod generation;
pub mod providers;
pub mod registry;
pub mod script;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunOptions, RunOutcome};
pub use errors::{AppError, FetchError, GenerationError, ProviderError, ScriptError};
pub use generation::{BatchPlanner, ScriptAssembler};
pub use registry::ScriptRegistry;
pub use script::{CodeHighlight, Scene, Script, SourceFile};
