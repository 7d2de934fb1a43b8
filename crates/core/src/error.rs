//! Crate-wide error type
//!
//! Every fallible operation in the crate returns [`WakeError`]. Collaborator
//! failures propagate unchanged; the engine wraps per-chunk failures in
//! [`WakeError::ChunkFailed`] so the caller learns which chunk broke.

use serde::{Deserialize, Serialize};

use crate::core_types::Axis;
use crate::engine::ChunkKey;

/// Errors raised by the wake calculation and its execution engines
///
/// The enum is serializable so a failure on a cluster worker reaches the
/// caller intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WakeError {
    /// A model name is not present in the registry
    UnknownModel {
        /// Registry kind, e.g. `"wake model"`
        kind: String,
        /// Requested name
        name: String,
        /// Sorted list of registered names
        available: Vec<String>,
    },
    /// An engine name is not known to the engine factory
    UnknownEngine {
        /// Requested name
        name: String,
        /// Sorted list of engine names
        available: Vec<String>,
    },
    /// A second engine was initialized while one is active
    EngineAlreadyActive {
        /// Name of the engine currently active
        active: String,
        /// Name of the engine that was rejected
        requested: String,
    },
    /// A calculation was requested without an active engine
    EngineNotInitialized,
    /// A required variable has no producer
    MissingVariable {
        /// Variable name
        var: String,
        /// Where it was looked up
        context: String,
    },
    /// A chunk calculation did not return all requested output variables
    MissingResults {
        /// Variables that could not be filled
        vars: Vec<String>,
        /// Shape they were expected to have
        expected_shape: Vec<usize>,
    },
    /// An array does not have the expected shape
    ShapeMismatch {
        /// Which array (or which model produced it)
        what: String,
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        actual: Vec<usize>,
    },
    /// Chunk sizes along an axis do not add up to the axis extent
    ChunkSizes {
        /// Chunked axis
        axis: Axis,
        /// Sum of the computed chunk sizes
        sum: usize,
        /// Axis extent
        extent: usize,
    },
    /// An axis that must be non-empty has zero length
    EmptyAxis {
        /// The empty axis
        axis: Axis,
    },
    /// Configuration rejected by validation or parsing
    InvalidConfig(String),
    /// A chunk failed; the whole calculation is aborted
    ChunkFailed {
        /// Key of the failing chunk
        key: ChunkKey,
        /// Underlying failure
        source: Box<WakeError>,
    },
    /// Encoding, decoding or channel failure between engine and workers
    Transport(String),
    /// A worker did not deliver a result in time
    Timeout {
        /// Configured wait in milliseconds
        waited_ms: u64,
        /// Results still outstanding when the wait expired
        outstanding: usize,
    },
}

/// Crate result alias
pub type Result<T> = std::result::Result<T, WakeError>;

impl WakeError {
    /// Build a `MissingVariable` error
    pub fn missing_variable(var: &str, context: &str) -> Self {
        Self::MissingVariable {
            var: var.to_string(),
            context: context.to_string(),
        }
    }

    /// Build a `ShapeMismatch` error
    pub fn shape_mismatch(what: impl Into<String>, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Innermost error, looking through `ChunkFailed` wrappers
    #[must_use]
    pub fn root_cause(&self) -> &WakeError {
        match self {
            Self::ChunkFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl std::fmt::Display for WakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WakeError::UnknownModel {
                kind,
                name,
                available,
            } => write!(
                f,
                "Unknown {kind} '{name}', available: {}",
                available.join(", ")
            ),
            WakeError::UnknownEngine { name, available } => write!(
                f,
                "Unknown engine '{name}', available: {}",
                available.join(", ")
            ),
            WakeError::EngineAlreadyActive { active, requested } => write!(
                f,
                "Cannot initialize engine '{requested}', engine '{active}' is already active"
            ),
            WakeError::EngineNotInitialized => write!(f, "No engine has been initialized"),
            WakeError::MissingVariable { var, context } => {
                write!(f, "Missing variable '{var}' in {context}")
            }
            WakeError::MissingResults {
                vars,
                expected_shape,
            } => write!(
                f,
                "Missing results {vars:?}, expected shape {expected_shape:?}"
            ),
            WakeError::ShapeMismatch {
                what,
                expected,
                actual,
            } => write!(
                f,
                "Shape mismatch for {what}: expected {expected:?}, got {actual:?}"
            ),
            WakeError::ChunkSizes { axis, sum, extent } => write!(
                f,
                "Chunk sizes along {axis} sum to {sum}, expected {extent}"
            ),
            WakeError::EmptyAxis { axis } => write!(f, "Axis {axis} has zero length"),
            WakeError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
            WakeError::ChunkFailed { key, source } => {
                write!(f, "Chunk {key} failed: {source}")
            }
            WakeError::Transport(msg) => write!(f, "Transport failure: {msg}"),
            WakeError::Timeout {
                waited_ms,
                outstanding,
            } => write!(
                f,
                "Timed out after {waited_ms} ms with {outstanding} chunk results outstanding"
            ),
        }
    }
}

impl std::error::Error for WakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WakeError::ChunkFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_unknown_model_lists_names() {
        let err = WakeError::UnknownModel {
            kind: "wake model".to_string(),
            name: "gauss".to_string(),
            available: vec!["jensen".to_string(), "jensen_k0.05".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown wake model 'gauss', available: jensen, jensen_k0.05"
        );
    }

    #[test]
    fn test_chunk_failed_source_chain() {
        let inner = WakeError::missing_variable("WS", "model data");
        let err = WakeError::ChunkFailed {
            key: ChunkKey::new(1, 0),
            source: Box::new(inner.clone()),
        };
        assert!(err.to_string().contains("(1, 0)"));
        assert!(err.source().is_some());
        assert_eq!(err.root_cause(), &inner);
    }
}
