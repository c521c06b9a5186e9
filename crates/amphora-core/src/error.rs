//! Error types for the Amphora pipeline.

use thiserror::Error;

/// Fatal pipeline errors.
///
/// Everything here bypasses the error-page render path and surfaces as a
/// minimal internal-error response. Recoverable conditions (preload
/// `error()` calls, preload failures outside error rendering) never
/// become an `AmphoraError`; they re-enter the pipeline on the error
/// page instead.
#[derive(Error, Debug)]
pub enum AmphoraError {
    /// The injected session getter failed.
    #[error("Session retrieval failed: {0}")]
    Session(String),

    /// Two preload callbacks asked for different redirects.
    #[error("Conflicting redirects")]
    ConflictingRedirects,

    /// Build metadata could not be read or parsed.
    #[error("Invalid build metadata: {0}")]
    BuildInfo(String),

    /// The base template could not be read.
    #[error("Template read failed: {0}")]
    Template(String),

    /// A required pipeline dependency was not injected.
    #[error("Handler misconfigured: {0}")]
    Config(String),
}
