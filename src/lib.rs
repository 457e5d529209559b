//! Validate HTTP response metadata before the body is consumed.
//!
//! An HTTP client usually learns the status code, headers and protocol
//! version of a response well before the body arrives. This crate lets the
//! caller declare what a good response looks like and reject anything else at
//! that point, without reading or discarding the body:
//!
//! - **Rules**: [`RuleSet`] holds the allowed status codes, required headers
//!   (exact value sequences, case-insensitive names) and expected version
//! - **Gate**: [`ResponseValidator`] checks a [`RuleSet`] and only then asks
//!   the wrapped [`BodyHandler`] for a body consumer
//! - **Failures**: [`ValidationFailure`] reports which expectation failed and
//!   why, one variant per rule category
//!
//! Rules are evaluated in a fixed order (status code, headers, version) and
//! evaluation stops at the first violation.
//!
//! # Examples
//!
//! ```
//! use response_gate::{ResponseMeta, ResponseValidator, ValidationFailure};
//! use http::Version;
//!
//! let validator = ResponseValidator::builder(|_: &ResponseMeta<'_>| "read the body")
//!     .allowed_status_code(200)
//!     .required_header("Content-Type", ["text/html; charset=utf-8"])
//!     .expected_version(Version::HTTP_2)
//!     .build()
//!     .expect("valid configuration");
//!
//! let response = http::Response::builder()
//!     .status(200)
//!     .version(Version::HTTP_2)
//!     .header("content-type", "text/html")
//!     .body(())
//!     .unwrap();
//!
//! match validator.evaluate(&ResponseMeta::from_response(&response)) {
//!     Ok(consumer) => println!("{}", consumer),
//!     Err(ValidationFailure::Header { unmet, .. }) => {
//!         assert_eq!(unmet.name(), "content-type");
//!     }
//!     Err(other) => panic!("unexpected failure: {}", other),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod handler;
mod metadata;
mod rules;
mod validator;

#[cfg(test)]
mod test_utils;

pub use error::{ConfigurationError, Error, ValidationFailure, ViolationKind};
pub use handler::BodyHandler;
pub use metadata::ResponseMeta;
pub use rules::{HeaderRequirement, RuleSet, RuleSetBuilder, ValidationOutcome};
pub use validator::{ResponseValidator, ValidatorBuilder};
