use http::Version;

use crate::{
    error::{ConfigurationError, ValidationFailure},
    handler::BodyHandler,
    metadata::ResponseMeta,
    rules::{RuleSet, RuleSetBuilder},
};

/// A body handler that only runs once the response metadata checks out.
///
/// `ResponseValidator` wraps a downstream [`BodyHandler`] together with a
/// [`RuleSet`]. For every response it first checks the status code, headers
/// and version; only when all of them pass does it hand the metadata to the
/// wrapped handler. On failure the wrapped handler is never called, so the
/// body is never read.
///
/// The validator itself implements [`BodyHandler`], which lets validators be
/// nested or passed anywhere a handler is expected.
///
/// # Examples
///
/// ```
/// use response_gate::{ResponseMeta, ResponseValidator, ViolationKind};
/// use http::{HeaderMap, Version};
///
/// let validator = ResponseValidator::builder(|meta: &ResponseMeta<'_>| meta.status())
///     .allowed_status_code(200)
///     .required_header("Content-Type", ["text/html; charset=utf-8"])
///     .expected_version(Version::HTTP_2)
///     .build()
///     .expect("valid configuration");
///
/// let mut headers = HeaderMap::new();
/// headers.insert("content-type", "text/html; charset=utf-8".parse().unwrap());
///
/// let consumer = validator
///     .evaluate(&ResponseMeta::new(200, &headers, Version::HTTP_2))
///     .expect("response accepted");
/// assert_eq!(consumer, 200);
///
/// let failure = validator
///     .evaluate(&ResponseMeta::new(404, &headers, Version::HTTP_2))
///     .unwrap_err();
/// assert_eq!(failure.kind(), ViolationKind::StatusCode);
/// ```
#[derive(Debug, Clone)]
pub struct ResponseValidator<H> {
    rules: RuleSet,
    handler: H,
}

impl<H> ResponseValidator<H> {
    /// Creates a validator from a finished rule set and a downstream handler.
    pub fn new(rules: RuleSet, handler: H) -> Self {
        Self { rules, handler }
    }

    /// Returns a builder with the downstream handler already supplied.
    pub fn builder(handler: H) -> ValidatorBuilder<H> {
        ValidatorBuilder::new().handler(handler)
    }

    /// The rules this validator enforces.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The wrapped downstream handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Unwraps the downstream handler.
    pub fn into_inner(self) -> H {
        self.handler
    }
}

impl<H: BodyHandler> ResponseValidator<H> {
    /// Validates response metadata and, on success, obtains the body consumer.
    ///
    /// The wrapped handler is invoked exactly once if every rule passes and
    /// not at all otherwise. Evaluation holds no state between calls, so the
    /// same metadata always produces the same outcome.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationFailure`] found, checking status code,
    /// then headers, then version.
    pub fn evaluate(&self, meta: &ResponseMeta<'_>) -> Result<H::Consumer, ValidationFailure> {
        if let Err(failure) = self.rules.check(meta) {
            // Header values stay in the returned error; they may carry cookies or tokens
            let header = match &failure {
                ValidationFailure::Header { unmet, .. } => Some(unmet.name().as_str()),
                _ => None,
            };
            tracing::warn!(
                target: "response_gate",
                kind = %failure.kind(),
                status = meta.status(),
                version = ?meta.version(),
                header,
                "response rejected before body"
            );
            return Err(failure);
        }

        tracing::debug!(
            target: "response_gate",
            status = meta.status(),
            version = ?meta.version(),
            "response metadata accepted"
        );
        Ok(self.handler.handle(meta))
    }
}

impl<H: BodyHandler> BodyHandler for ResponseValidator<H> {
    type Consumer = Result<H::Consumer, ValidationFailure>;

    fn handle(&self, meta: &ResponseMeta<'_>) -> Self::Consumer {
        self.evaluate(meta)
    }
}

/// Builder for a [`ResponseValidator`].
///
/// Collects the downstream handler and the expectations in any order. Every
/// expectation is optional; a builder with only a handler yields a validator
/// that accepts all responses.
///
/// # Examples
///
/// ```
/// use response_gate::{ConfigurationError, ResponseMeta, ValidatorBuilder};
///
/// let missing = ValidatorBuilder::<fn(&ResponseMeta<'_>)>::new()
///     .allowed_status_code(200)
///     .build();
/// assert!(matches!(missing, Err(ConfigurationError::MissingHandler)));
/// ```
#[derive(Debug)]
pub struct ValidatorBuilder<H> {
    rules: RuleSetBuilder,
    handler: Option<H>,
}

impl<H> ValidatorBuilder<H> {
    /// Creates an empty builder with no handler and no expectations.
    pub fn new() -> Self {
        Self {
            rules: RuleSet::builder(),
            handler: None,
        }
    }

    /// Sets the downstream handler, replacing any previous one.
    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Adds a status code the response may carry. Repeatable.
    ///
    /// Codes outside `100..=999` are not valid HTTP status codes and make
    /// [`build`](Self::build) fail with
    /// [`ConfigurationError::InvalidStatusCode`].
    pub fn allowed_status_code(mut self, code: u16) -> Self {
        self.rules = self.rules.allow_status(code);
        self
    }

    /// Requires a header with exactly the given value sequence. Repeatable;
    /// a later call for the same name replaces the earlier one.
    pub fn required_header<I, V>(mut self, name: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        self.rules = self.rules.require_header(name, values);
        self
    }

    /// Sets the protocol version the response must use.
    pub fn expected_version(mut self, version: Version) -> Self {
        self.rules = self.rules.expect_version(version);
        self
    }

    /// Builds the validator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingHandler`] if no handler was
    /// supplied, or the first invalid expectation otherwise.
    pub fn build(self) -> Result<ResponseValidator<H>, ConfigurationError> {
        let handler = self.handler.ok_or(ConfigurationError::MissingHandler)?;
        let rules = self.rules.build()?;
        Ok(ResponseValidator::new(rules, handler))
    }
}

impl<H> Default for ValidatorBuilder<H> {
    fn default() -> Self {
        Self::new()
    }
}
