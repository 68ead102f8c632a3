use showroom_anthropic::ClaudeError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the agent client
///
/// Only failures to obtain a reply are errors. A reply that arrives but
/// cannot be parsed is downgraded to a fallback intent instead.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The classification request failed or returned a non-success status
    #[error("classifier transport failed: {0}")]
    Transport(#[from] ClaudeError),

    /// No reply within the configured limit
    #[error("classifier did not reply within {0:?}")]
    Timeout(Duration),

    /// The classifier could not be reached for another reason
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}
