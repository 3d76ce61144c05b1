//! Unified error type for reconciliation
//!
//! One flat enum covers every failure the core can surface. Derivation and
//! lookup failures are reported to the immediate caller; producer failures
//! travel through the background error channel of the owning entity.

/// Unified error type for all Nacht operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NachtError {
    /// A derivation function failed while resolving a key
    #[error("Derivation failed for '{key}': {message}")]
    Derivation {
        /// Key whose derivation failed
        key: String,
        /// Message reported by the derivation
        message: String,
    },

    /// An asynchronous producer yielded an error instead of a value
    #[error("Producer failed for '{key}': {message}")]
    Producer {
        /// Key the producer was feeding
        key: String,
        /// Message reported by the producer
        message: String,
    },

    /// A selector path did not resolve to an object
    #[error("Lookup failed at depth {depth} of {path:?}: {reason}")]
    Lookup {
        /// Full path that was being resolved
        path: Vec<usize>,
        /// Index into `path` where resolution stopped
        depth: usize,
        /// Why resolution stopped
        reason: String,
    },

    /// The controller was asked to build an object of an unknown kind
    #[error("Unsupported kind: {kind}")]
    UnsupportedKind {
        /// The rejected kind tag (empty when the tag was missing)
        kind: String,
    },

    /// Params did not match the schema of the requested kind
    #[error("Invalid params for {kind}: {message}")]
    InvalidParams {
        /// Kind whose schema rejected the params
        kind: String,
        /// Schema violation description
        message: String,
    },

    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Background work could not be scheduled
    #[error("Runtime error: {message}")]
    Runtime {
        /// Error message describing the scheduling failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl NachtError {
    /// Create a derivation error
    pub fn derivation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Derivation {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a producer error
    pub fn producer(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Producer {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a lookup error
    pub fn lookup(path: &[usize], depth: usize, reason: impl Into<String>) -> Self {
        Self::Lookup {
            path: path.to_vec(),
            depth,
            reason: reason.into(),
        }
    }

    /// Create an unsupported kind error
    pub fn unsupported_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedKind { kind: kind.into() }
    }

    /// Create an invalid params error
    pub fn invalid_params(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for failures raised while resolving values.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Derivation { .. } | Self::Producer { .. })
    }
}

/// Standard Result type for Nacht operations
pub type Result<T> = std::result::Result<T, NachtError>;

impl From<serde_json::Error> for NachtError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid(err.to_string())
    }
}
