//! # Error Handling
//!
//! Error types for the reconciliation pipeline. Each variant covers one
//! failure domain (configuration, decoding, transport, protocol, budget
//! inputs) with constructor helpers so call sites stay short.
//!
//! Two outcomes from the pipeline are deliberately *not* errors:
//!
//! - A target pixel with no matching canvas entry is a classification
//!   outcome (excluded from both diff sets), never an error.
//! - Budget exhaustion leaves candidates unselected and is reported through
//!   counts and costs, never raised.
//!
//! Remote rejections and short level-query responses, on the other hand,
//! are fatal for the run: the pipeline halts without retrying, because a
//! mispriced or mistaken write on a shared credit-limited canvas cannot be
//! rolled back.

use std::{error::Error as StdError, fmt};

/// Convenience alias used throughout the crate.
pub type WardenResult<T> = Result<T, WardenError>;

/// Base error type for the reconciliation pipeline.
#[derive(Debug)]
pub enum WardenError {
    /// Configuration validation failures
    Config { field: String, reason: String },
    /// File access failures (overlay image, palette cache, saved snapshots)
    Io {
        path: String,
        source: std::io::Error,
    },
    /// Bitmap decode failures
    Decode { reason: String },
    /// Palette parsing or sizing failures
    Palette { reason: String },
    /// Transport-level failures talking to the canvas service
    Network {
        operation: String,
        source: Box<dyn StdError + Send + Sync>,
    },
    /// Responses that arrived but do not have the expected shape
    Protocol { operation: String, reason: String },
    /// A level query that answered fewer coordinates than were asked.
    /// Treating the gaps as level 0 would misprice admission decisions,
    /// so the whole pass fails instead.
    LevelQuery { requested: usize, received: usize },
    /// The remote canvas rejected a mutation batch. Fatal: no further
    /// batches are sent and nothing already sent is rolled back.
    Rejected { messages: Vec<String> },
}

impl WardenError {
    /// Create a configuration error
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a file access error
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a bitmap decode error
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Create a palette error
    pub fn palette(reason: impl Into<String>) -> Self {
        Self::Palette {
            reason: reason.into(),
        }
    }

    /// Create a transport error
    pub fn network(
        operation: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Create a malformed-response error
    pub fn protocol(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Protocol {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a short level-query response error
    pub fn level_query(requested: usize, received: usize) -> Self {
        Self::LevelQuery {
            requested,
            received,
        }
    }

    /// Create a remote rejection error from the service's error messages
    pub fn rejected(messages: Vec<String>) -> Self {
        Self::Rejected { messages }
    }

    /// Whether this error must abort the whole run rather than one step.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::LevelQuery { .. })
    }
}

impl fmt::Display for WardenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { field, reason } => {
                write!(f, "invalid configuration for '{}': {}", field, reason)
            }
            Self::Io { path, source } => write!(f, "cannot access '{}': {}", path, source),
            Self::Decode { reason } => write!(f, "bitmap decode failed: {}", reason),
            Self::Palette { reason } => write!(f, "palette error: {}", reason),
            Self::Network { operation, source } => {
                write!(f, "network failure during {}: {}", operation, source)
            }
            Self::Protocol { operation, reason } => {
                write!(f, "unexpected {} response: {}", operation, reason)
            }
            Self::LevelQuery {
                requested,
                received,
            } => write!(
                f,
                "level query answered {} of {} requested pixels",
                received, requested
            ),
            Self::Rejected { messages } => {
                write!(f, "canvas rejected mutation: {}", messages.join("; "))
            }
        }
    }
}

impl StdError for WardenError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Network { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = WardenError::config("batch_size", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration for 'batch_size': must be greater than 0"
        );

        let err = WardenError::level_query(5, 3);
        assert_eq!(
            err.to_string(),
            "level query answered 3 of 5 requested pixels"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(WardenError::rejected(vec!["not enough credits".into()]).is_fatal());
        assert!(WardenError::level_query(4, 2).is_fatal());
        assert!(!WardenError::decode("truncated PNG").is_fatal());
    }
}
