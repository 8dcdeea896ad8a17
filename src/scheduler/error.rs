//! Error types for the scheduler module

use std::fmt;

use crate::models::SourceId;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Capture inventory lists no capture cards
    NoCaptureCards,

    /// Capture inventory lists no video sources
    NoSources,

    /// A source has no card input bound to it (strict topology only)
    UnboundSource { source_id: SourceId, name: String },

    /// The backing store failed
    Store { operation: String, reason: String },

    /// Invalid scheduler configuration
    InvalidConfig { field: String, reason: String },

    /// Serialization/deserialization error
    Serialization { reason: String },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCaptureCards => {
                write!(f, "No capture cards are defined in the database")
            }
            Self::NoSources => {
                write!(f, "No channel sources are defined in the database")
            }
            Self::UnboundSource { source_id, name } => {
                write!(
                    f,
                    "Source {} ({}) is defined, but isn't attached to a card input",
                    source_id, name
                )
            }
            Self::Store { operation, reason } => {
                write!(f, "Store error during '{}': {}", operation, reason)
            }
            Self::InvalidConfig { field, reason } => {
                write!(f, "Scheduler config error in '{}': {}", field, reason)
            }
            Self::Serialization { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

impl SchedulerError {
    /// Create a store error with context
    pub fn store(operation: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::Store {
            operation: operation.into(),
            reason: err.to_string(),
        }
    }

    /// Create an unbound source error
    pub fn unbound_source(source_id: SourceId, name: impl Into<String>) -> Self {
        Self::UnboundSource {
            source_id,
            name: name.into(),
        }
    }

    /// Create a config error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Topology errors mean the process must refuse to schedule
    pub fn is_fatal_setup(&self) -> bool {
        matches!(
            self,
            Self::NoCaptureCards | Self::NoSources | Self::UnboundSource { .. }
        )
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Store { .. })
    }
}
