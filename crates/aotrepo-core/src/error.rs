use std::fmt;
use thiserror::Error as ThisError;

///
/// ContributionError
///
/// Hard build-time failure raised while contributing one repository method.
/// Soft outcomes (unsupported or metadata-only methods) are never errors.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{origin}:{class}: {message}{location}")]
pub struct ContributionError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
    pub location: ErrorLocation,
}

impl ContributionError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            location: ErrorLocation::default(),
        }
    }

    /// Construct a query-origin error for input that cannot be derived or parsed.
    pub fn query_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Invalid, ErrorOrigin::Query, message)
    }

    /// Construct a query-origin error for query shapes the resolver cannot express.
    pub fn query_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Query, message)
    }

    pub fn classify_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Invalid, ErrorOrigin::Classify, message)
    }

    pub fn entity_graph_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Invalid, ErrorOrigin::EntityGraph, message)
    }

    pub fn compose_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Invalid, ErrorOrigin::Compose, message)
    }

    /// Construct a metamodel-origin lookup failure.
    pub fn metamodel_not_found(what: &str, name: &str) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Metamodel,
            format!("{what} not found in metamodel: '{name}'"),
        )
    }

    /// Attach the offending method unless a location is already present.
    #[must_use]
    pub fn at(mut self, location: MethodLocation) -> Self {
        if self.location.0.is_none() {
            self.location = ErrorLocation(Some(location));
        }

        self
    }

    #[must_use]
    pub const fn method_location(&self) -> Option<&MethodLocation> {
        self.location.0.as_ref()
    }
}

///
/// MethodLocation
///
/// Declaring repository and rendered signature of the method that failed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodLocation {
    pub repository: String,
    pub signature: String,
}

impl fmt::Display for MethodLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.repository, self.signature)
    }
}

///
/// ErrorLocation
/// Optional location suffix rendered after the error message.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorLocation(pub Option<MethodLocation>);

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(location) => write!(f, " (at {location})"),
            None => Ok(()),
        }
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    Invalid,
    InvariantViolation,
    NotFound,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Invalid => "invalid",
            Self::InvariantViolation => "invariant_violation",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    Classify,
    Compose,
    EntityGraph,
    Metamodel,
    Query,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Classify => "classify",
            Self::Compose => "compose",
            Self::EntityGraph => "entity_graph",
            Self::Metamodel => "metamodel",
            Self::Query => "query",
        };
        write!(f, "{label}")
    }
}
