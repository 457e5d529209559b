use std::collections::BTreeSet;
use std::fmt;

use http::{HeaderMap, Version};

use crate::rules::HeaderRequirement;

/// Errors that can occur while configuring or running a response validator.
///
/// Most callers only ever see one of the two halves: [`ConfigurationError`]
/// from `build()`, or [`ValidationFailure`] from `evaluate()`. `Error` exists
/// for code that wants a single error type across both.
#[derive(Debug)]
pub enum Error {
    /// The response metadata did not satisfy the rule set
    Validation(ValidationFailure),
    /// The validator could not be constructed
    Configuration(ConfigurationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(v) => write!(f, "response validation failed: {}", v),
            Error::Configuration(c) => write!(f, "invalid validator configuration: {}", c),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Validation(v) => Some(v),
            Error::Configuration(c) => Some(c),
        }
    }
}

impl From<ValidationFailure> for Error {
    fn from(v: ValidationFailure) -> Self {
        Error::Validation(v)
    }
}

impl From<ConfigurationError> for Error {
    fn from(c: ConfigurationError) -> Self {
        Error::Configuration(c)
    }
}

/// The category of rule a response violated.
///
/// Categories are checked in declaration order: status code, then headers,
/// then version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// The status code was not in the allowed set
    StatusCode,
    /// A required header was missing or its values did not match
    Header,
    /// The protocol version did not match
    Version,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::StatusCode => write!(f, "status code"),
            ViolationKind::Header => write!(f, "header"),
            ViolationKind::Version => write!(f, "version"),
        }
    }
}

/// A response whose metadata did not meet the declared expectations.
///
/// Each variant carries enough context to explain the rejection without
/// access to the original response. None of these are retryable: they
/// describe the response, not the transport.
///
/// # Examples
///
/// ```
/// use response_gate::{ResponseMeta, RuleSet, ValidationFailure, ViolationKind};
/// use http::{HeaderMap, Version};
///
/// let rules = RuleSet::builder().allow_status(200).build().unwrap();
/// let headers = HeaderMap::new();
/// let meta = ResponseMeta::new(404, &headers, Version::HTTP_11);
///
/// match rules.check(&meta) {
///     Err(ValidationFailure::StatusCode { received, allowed }) => {
///         assert_eq!(received, 404);
///         assert!(allowed.contains(&200));
///     }
///     other => panic!("unexpected outcome: {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    /// The received status code is not one of the allowed codes.
    StatusCode {
        /// Status code of the response
        received: u16,
        /// Every status code the rule set accepts
        allowed: BTreeSet<u16>,
    },
    /// A required header was absent or its value sequence differed.
    Header {
        /// The first requirement that was not met
        unmet: HeaderRequirement,
        /// All headers present on the response
        received: HeaderMap,
        /// All header requirements of the rule set
        required: Vec<HeaderRequirement>,
    },
    /// The protocol version of the response differs from the expected one.
    Version {
        /// Version of the response
        received: Version,
        /// Version the rule set expects
        expected: Version,
    },
}

impl ValidationFailure {
    /// Returns the category of this failure.
    pub fn kind(&self) -> ViolationKind {
        match self {
            ValidationFailure::StatusCode { .. } => ViolationKind::StatusCode,
            ValidationFailure::Header { .. } => ViolationKind::Header,
            ValidationFailure::Version { .. } => ViolationKind::Version,
        }
    }

    /// Searches an error and its chain of causes for a validation failure.
    ///
    /// Transports usually report a rejected response as their own error type
    /// with the failure attached as its cause. This walks `source()` links,
    /// and looks inside `std::io::Error` custom payloads, so callers can
    /// branch on the violation kind and rethrow anything else unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use response_gate::{ValidationFailure, ViolationKind};
    ///
    /// let failure = ValidationFailure::StatusCode {
    ///     received: 503,
    ///     allowed: BTreeSet::from([200]),
    /// };
    /// let transport_error = std::io::Error::other(failure);
    ///
    /// let found = ValidationFailure::find_in(&transport_error).expect("failure in chain");
    /// assert_eq!(found.kind(), ViolationKind::StatusCode);
    /// ```
    pub fn find_in<'a>(
        error: &'a (dyn std::error::Error + 'static),
    ) -> Option<&'a ValidationFailure> {
        let mut current = Some(error);
        while let Some(err) = current {
            if let Some(failure) = err.downcast_ref::<ValidationFailure>() {
                return Some(failure);
            }
            if let Some(Error::Validation(failure)) = err.downcast_ref::<Error>() {
                return Some(failure);
            }
            // io::Error::source() skips its own payload, so look at it directly
            if let Some(inner) = err
                .downcast_ref::<std::io::Error>()
                .and_then(|io| io.get_ref())
            {
                if let Some(failure) = Self::find_in(inner) {
                    return Some(failure);
                }
            }
            current = err.source();
        }
        None
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::StatusCode { received, allowed } => write!(
                f,
                "received status code: {}, allowed status codes: {:?}",
                received, allowed
            ),
            ValidationFailure::Header {
                unmet,
                received,
                required,
            } => write!(
                f,
                "missing required header: {}, received headers: {:?}, expected headers: {:?}",
                unmet, received, required
            ),
            ValidationFailure::Version { received, expected } => write!(
                f,
                "received response version: {:?}, expected response version: {:?}",
                received, expected
            ),
        }
    }
}

impl std::error::Error for ValidationFailure {}

/// An error raised while building a rule set or validator.
///
/// Configuration errors are reported by `build()` and never during
/// evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No downstream body handler was supplied to the builder
    MissingHandler,
    /// A required header name is not a valid HTTP header name
    InvalidHeaderName {
        /// The rejected name
        name: String,
    },
    /// An expected header value is not a valid HTTP header value
    InvalidHeaderValue {
        /// Header the value was declared for
        name: String,
    },
    /// A header requirement was declared without any values
    EmptyHeaderValues {
        /// Header the requirement was declared for
        name: String,
    },
    /// An allowed status code lies outside 100..=999
    InvalidStatusCode {
        /// The rejected code
        code: u16,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::MissingHandler => write!(f, "no body handler was supplied"),
            ConfigurationError::InvalidHeaderName { name } => {
                write!(f, "invalid header name '{}'", name)
            }
            ConfigurationError::InvalidHeaderValue { name } => {
                write!(f, "invalid value for header '{}'", name)
            }
            ConfigurationError::EmptyHeaderValues { name } => {
                write!(f, "no expected values for header '{}'", name)
            }
            ConfigurationError::InvalidStatusCode { code } => {
                write!(f, "invalid status code {}", code)
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}
