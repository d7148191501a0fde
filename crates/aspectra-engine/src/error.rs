//! Error types for the weaving engine
//!
//! Three families of errors mirror who broke a contract:
//! - [`AspectError`]: user code (an aspect, an annotation, a placeholder)
//!   violates an aspect contract
//! - [`AdviceError`]: an advice misuses the weaver API (e.g. proceeds a
//!   joinpoint twice)
//! - [`WeavingError`]: the weaver itself reaches an illegal state or cannot
//!   resolve something it needs
//!
//! Values thrown by member bodies or advices travel as [`Error::Thrown`].

use crate::config::ConfigError;
use crate::value::Value;

/// Result type used throughout the engine
pub type Result<T> = std::result::Result<T, Error>;

/// Violation of an aspect contract
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AspectError {
    /// Annotation applied on a target it does not support
    #[error("{annotation} cannot be applied on {target}: {reason}")]
    InvalidPlacement {
        /// Offending annotation
        annotation: String,
        /// Target description
        target: String,
        /// Why the placement is rejected
        reason: String,
    },

    /// The value passed where an aspect was expected is not a registered aspect
    #[error("{0} is not a registered aspect")]
    NotAnAspect(String),

    /// `abstract_value()` used outside of a woven member's return expression
    #[error("\"abstract()\" placeholder should only be used as a return value.")]
    AbstractPlaceholder,

    /// A single-argument bridge adapter received the wrong number of arguments
    #[error("{annotation} bridge expects exactly 1 argument, got {got}")]
    BridgeArity {
        /// Source annotation of the bridge
        annotation: String,
        /// Number of arguments received
        got: usize,
    },

    /// Annotation arguments rejected by its stub
    #[error("invalid arguments for {annotation}: {reason}")]
    InvalidArguments {
        /// Annotation whose stub rejected the arguments
        annotation: String,
        /// Rejection reason
        reason: String,
    },

    /// Free-form aspect failure
    #[error("{0}")]
    Custom(String),
}

/// Misuse of the weaver API by an advice
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdviceError {
    /// A joinpoint was proceeded more than once in the same invocation
    #[error("{advice}: joinPoint already proceeded")]
    AlreadyProceeded {
        /// Name of the advice owning the joinpoint
        advice: String,
    },

    /// Joinpoint arguments were not a list
    #[error("{advice}: joinpoint arguments must be a list, got {got}")]
    NonArrayArguments {
        /// Name of the advice owning the joinpoint
        advice: String,
        /// Type name of the value received
        got: &'static str,
    },

    /// Around advice context used after its joinpoint was dropped
    #[error("{advice}: no joinpoint available")]
    MissingJoinPoint {
        /// Name of the advice
        advice: String,
    },
}

/// Illegal or inconsistent weaver state
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeavingError {
    /// Aspect id already registered and the policy rejects duplicates
    #[error("aspect id `{0}` is already registered")]
    DuplicateAspect(String),

    /// No provider registered for a requested component
    #[error("no provider registered for {0}")]
    MissingProvider(&'static str),

    /// Member lookup failed on a class
    #[error("{class} has no member `{member}`")]
    UnknownMember {
        /// Class name
        class: String,
        /// Member name
        member: String,
    },

    /// A woven constructor produced something other than an instance of its class
    #[error("constructor of {class} did not produce an instance of {class}")]
    ConstructorResult {
        /// Class name
        class: String,
    },

    /// A class was registered twice with the same id
    #[error("class `{0}` is already defined")]
    ClassAlreadyDefined(String),

    /// Any other inconsistency
    #[error("invalid weaver state: {0}")]
    InvalidState(String),
}

/// Top-level engine error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Aspect contract violation
    #[error("aspect error: {0}")]
    Aspect(#[from] AspectError),

    /// Advice API misuse
    #[error("advice error: {0}")]
    Advice(#[from] AdviceError),

    /// Weaver state error
    #[error("weaving error: {0}")]
    Weaving(#[from] WeavingError),

    /// Configuration could not be loaded
    #[error("config error: {0}")]
    Config(String),

    /// Value thrown by a member body or an advice
    #[error("{0}")]
    Thrown(Value),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    /// Create an error carrying a thrown value
    pub fn thrown(value: impl Into<Value>) -> Self {
        Error::Thrown(value.into())
    }

    /// Get the thrown value, if this error carries one
    pub fn thrown_value(&self) -> Option<&Value> {
        match self {
            Error::Thrown(value) => Some(value),
            _ => None,
        }
    }

    /// Check if this is an [`AspectError`]
    pub fn is_aspect_error(&self) -> bool {
        matches!(self, Error::Aspect(_))
    }

    /// Check if this is an [`AdviceError`]
    pub fn is_advice_error(&self) -> bool {
        matches!(self, Error::Advice(_))
    }

    /// Check if this is a [`WeavingError`]
    pub fn is_weaving_error(&self) -> bool {
        matches!(self, Error::Weaving(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_proceeded_message() {
        let err: Error = AdviceError::AlreadyProceeded {
            advice: "cache.around#0".to_string(),
        }
        .into();
        assert!(err.is_advice_error());
        assert!(err.to_string().contains("already proceeded"));
    }

    #[test]
    fn test_abstract_placeholder_message() {
        assert_eq!(
            AspectError::AbstractPlaceholder.to_string(),
            "\"abstract()\" placeholder should only be used as a return value."
        );
    }

    #[test]
    fn test_thrown_value_roundtrip() {
        let err = Error::thrown("boom");
        assert_eq!(err.thrown_value(), Some(&Value::from("boom")));
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_aspect_error());
    }
}
