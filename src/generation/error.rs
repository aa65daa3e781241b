//! Generation failure taxonomy.

use thiserror::Error;

/// Why the generative capability could not produce a value.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation is not configured: {0}")]
    NotConfigured(String),

    /// Rate-limit class failure; the only kind worth retrying.
    #[error("provider is throttling requests ({status}): {message}")]
    RateLimited { status: u16, message: String },

    #[error("provider rejected the request ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("could not reach provider: {0}")]
    Transport(String),

    #[error("provider returned malformed output: {0}")]
    Malformed(String),

    #[error("provider returned no results")]
    Empty,

    /// The task running the generation panicked or was shut down.
    #[error("generation task stopped: {0}")]
    Interrupted(String),

    #[error("gave up after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<tokio::task::JoinError> for GenerationError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Interrupted(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limits_are_transient() {
        let throttled = GenerationError::RateLimited {
            status: 429,
            message: "quota".into(),
        };
        assert!(throttled.is_transient());
        assert!(!GenerationError::Empty.is_transient());
        assert!(!GenerationError::Malformed("x".into()).is_transient());
        assert!(
            !GenerationError::RetriesExhausted {
                attempts: 3,
                last: Box::new(throttled),
            }
            .is_transient()
        );
    }
}
