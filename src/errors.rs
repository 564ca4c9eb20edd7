/*!
 * Error types for the codecast application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    ///
    /// `retry_after` carries the provider's reset hint verbatim when the
    /// response included one (e.g. "2.5s" or "1500ms").
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from the API
        message: String,
        /// Raw reset hint from the rate-limit response header, if any
        retry_after: Option<String>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while fetching source files
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL does not match any supported form; rejected immediately, never retried
    #[error("Malformed source URL: {0}")]
    MalformedUrl(String),

    /// The referenced file or directory does not exist
    #[error("Source not found: {0}")]
    NotFound(String),

    /// Error when making the fetch request fails
    #[error("Fetch request failed: {0}")]
    RequestFailed(String),

    /// Error reading from the local filesystem
    #[error("File error: {0}")]
    File(String),
}

/// Errors that can occur while converting provider output into a script
#[derive(Error, Debug)]
pub enum ScriptError {
    /// A JSON payload is missing a required field or has the wrong shape
    #[error("Schema error: {0}")]
    Schema(String),

    /// Raw provider output did not contain a decodable JSON payload
    #[error("Payload error: {0}")]
    Payload(String),
}

/// Errors that can occur during script generation
#[derive(Error, Debug)]
pub enum GenerationError {
    /// A non-retryable error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// All retry attempts for a provider call were exhausted
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Message of the final error observed
        last_error: String,
    },

    /// Error converting provider output into a script
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// No source files were available to generate a script from
    #[error("No source files to generate a script from")]
    NoSourceFiles,
}

impl GenerationError {
    /// Whether this error terminates only the current batch rather than the run
    pub fn is_batch_local(&self) -> bool {
        !matches!(self, Self::NoSourceFiles)
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error fetching source files
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error during script generation
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
