use std::collections::BTreeSet;
use std::fmt;

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};

use crate::error::{ConfigurationError, ValidationFailure};
use crate::metadata::ResponseMeta;

/// Result of checking response metadata against a [`RuleSet`].
///
/// `Ok(())` means every applicable rule passed.
pub type ValidationOutcome = Result<(), ValidationFailure>;

/// A header that must be present on a response with an exact value sequence.
///
/// Matching is all-or-nothing: the response must carry the header (name
/// compared case-insensitively) with exactly these values, in this order, and
/// no others. Extra values, missing values or reordered values all fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRequirement {
    name: HeaderName,
    values: Vec<HeaderValue>,
}

impl HeaderRequirement {
    /// Creates a requirement from already parsed header parts.
    pub fn new(name: HeaderName, values: Vec<HeaderValue>) -> Self {
        Self { name, values }
    }

    /// The required header name (always lowercase).
    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    /// The expected value sequence.
    pub fn values(&self) -> &[HeaderValue] {
        &self.values
    }

    /// Returns `true` if `headers` carries this header with exactly the
    /// expected value sequence.
    pub fn is_met_by(&self, headers: &HeaderMap) -> bool {
        headers.contains_key(&self.name) && headers.get_all(&self.name).iter().eq(&self.values)
    }
}

impl fmt::Display for HeaderRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.name, self.values)
    }
}

/// Immutable set of expectations a response must satisfy.
///
/// A rule set has three independent constraints, each of which may be left
/// empty to disable it:
///
/// - allowed status codes (empty = any status)
/// - required headers (empty = no header checks)
/// - expected protocol version (`None` = any version)
///
/// A rule set with all three empty accepts every response.
///
/// # Examples
///
/// ```
/// use response_gate::{ResponseMeta, RuleSet, ViolationKind};
/// use http::{HeaderMap, Version};
///
/// let rules = RuleSet::builder()
///     .allow_status(200)
///     .require_header("Content-Type", ["application/json"])
///     .expect_version(Version::HTTP_2)
///     .build()
///     .expect("valid configuration");
///
/// let mut headers = HeaderMap::new();
/// headers.insert("content-type", "application/json".parse().unwrap());
///
/// assert!(rules.check(&ResponseMeta::new(200, &headers, Version::HTTP_2)).is_ok());
///
/// let err = rules
///     .check(&ResponseMeta::new(200, &headers, Version::HTTP_11))
///     .unwrap_err();
/// assert_eq!(err.kind(), ViolationKind::Version);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    allowed_status_codes: BTreeSet<u16>,
    required_headers: Vec<HeaderRequirement>,
    expected_version: Option<Version>,
}

impl RuleSet {
    /// Returns a builder for accumulating expectations.
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// Creates a rule set from all of its fields at once.
    ///
    /// Applies the same rules as the builder: duplicate status codes collapse
    /// and a later requirement for the same header name replaces an earlier
    /// one.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if a status code is outside
    /// `100..=999` or a header requirement has no values.
    pub fn new(
        allowed_status_codes: impl IntoIterator<Item = u16>,
        required_headers: impl IntoIterator<Item = HeaderRequirement>,
        expected_version: Option<Version>,
    ) -> Result<Self, ConfigurationError> {
        let mut builder = allowed_status_codes
            .into_iter()
            .fold(RuleSet::builder(), RuleSetBuilder::allow_status);
        builder = required_headers
            .into_iter()
            .fold(builder, RuleSetBuilder::require);
        builder.version = expected_version;
        builder.build()
    }

    /// A rule set that accepts every response.
    pub fn pass_through() -> Self {
        Self::default()
    }

    /// Allowed status codes, in ascending order.
    pub fn allowed_status_codes(&self) -> &BTreeSet<u16> {
        &self.allowed_status_codes
    }

    /// Header requirements, in the order they were first declared.
    pub fn required_headers(&self) -> &[HeaderRequirement] {
        &self.required_headers
    }

    /// The expected protocol version, if any.
    pub fn expected_version(&self) -> Option<Version> {
        self.expected_version
    }

    /// Returns `true` if no constraint is configured.
    pub fn is_pass_through(&self) -> bool {
        self.allowed_status_codes.is_empty()
            && self.required_headers.is_empty()
            && self.expected_version.is_none()
    }

    /// Checks response metadata against every rule.
    ///
    /// Categories are evaluated in a fixed order: status code, headers,
    /// version. The first violated category ends the check, and within the
    /// header category the first unmet requirement (in declaration order)
    /// is the one reported.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationFailure`] encountered.
    pub fn check(&self, meta: &ResponseMeta<'_>) -> ValidationOutcome {
        self.check_status(meta)?;
        self.check_headers(meta)?;
        self.check_version(meta)
    }

    fn check_status(&self, meta: &ResponseMeta<'_>) -> ValidationOutcome {
        if self.allowed_status_codes.is_empty()
            || self.allowed_status_codes.contains(&meta.status())
        {
            return Ok(());
        }
        Err(ValidationFailure::StatusCode {
            received: meta.status(),
            allowed: self.allowed_status_codes.clone(),
        })
    }

    fn check_headers(&self, meta: &ResponseMeta<'_>) -> ValidationOutcome {
        let headers = meta.headers();
        match self
            .required_headers
            .iter()
            .find(|req| !req.is_met_by(headers))
        {
            None => Ok(()),
            Some(unmet) => Err(ValidationFailure::Header {
                unmet: unmet.clone(),
                received: headers.clone(),
                required: self.required_headers.clone(),
            }),
        }
    }

    fn check_version(&self, meta: &ResponseMeta<'_>) -> ValidationOutcome {
        match self.expected_version {
            Some(expected) if expected != meta.version() => Err(ValidationFailure::Version {
                received: meta.version(),
                expected,
            }),
            _ => Ok(()),
        }
    }
}

/// Accumulates expectations for a [`RuleSet`].
///
/// All methods are additive and may be called in any order. Invalid input is
/// remembered and reported by [`build`](Self::build), so a chain of calls
/// never has to be interrupted.
///
/// Repeated calls behave as follows:
///
/// - `allow_status`: set semantics, duplicates are ignored
/// - `require_header`: last write wins per case-insensitive name; the
///   replacement keeps the position of the first declaration
/// - `expect_version`: last write wins
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    allowed: BTreeSet<u16>,
    required: Vec<HeaderRequirement>,
    version: Option<Version>,
    error: Option<ConfigurationError>,
}

impl RuleSetBuilder {
    /// Adds a status code to the allowed set.
    ///
    /// A code outside `100..=999` is recorded as
    /// [`ConfigurationError::InvalidStatusCode`] and reported by `build`.
    pub fn allow_status(mut self, code: u16) -> Self {
        if StatusCode::from_u16(code).is_ok() {
            self.allowed.insert(code);
        } else {
            self.fail(ConfigurationError::InvalidStatusCode { code });
        }
        self
    }

    /// Requires a header with exactly the given value sequence.
    ///
    /// ```
    /// use response_gate::RuleSet;
    ///
    /// let rules = RuleSet::builder()
    ///     .require_header("Cache-Control", ["no-cache"])
    ///     .require_header("cache-control", ["no-store"])
    ///     .build()
    ///     .unwrap();
    ///
    /// // Same name, case-insensitively: the later call wins.
    /// assert_eq!(rules.required_headers().len(), 1);
    /// assert_eq!(rules.required_headers()[0].values()[0], "no-store");
    /// ```
    pub fn require_header<I, V>(mut self, name: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let name = name.as_ref();
        let Ok(header) = HeaderName::from_bytes(name.as_bytes()) else {
            self.fail(ConfigurationError::InvalidHeaderName {
                name: name.to_string(),
            });
            return self;
        };

        let parsed: Result<Vec<_>, _> = values
            .into_iter()
            .map(|v| HeaderValue::from_str(v.as_ref()))
            .collect();
        match parsed {
            Ok(values) => self.require(HeaderRequirement::new(header, values)),
            Err(_) => {
                self.fail(ConfigurationError::InvalidHeaderValue {
                    name: header.to_string(),
                });
                self
            }
        }
    }

    /// Adds an already parsed header requirement.
    pub fn require(mut self, requirement: HeaderRequirement) -> Self {
        if requirement.values.is_empty() {
            self.fail(ConfigurationError::EmptyHeaderValues {
                name: requirement.name.to_string(),
            });
            return self;
        }

        match self
            .required
            .iter_mut()
            .find(|existing| existing.name == requirement.name)
        {
            Some(existing) => *existing = requirement,
            None => self.required.push(requirement),
        }
        self
    }

    /// Sets the protocol version the response must use.
    pub fn expect_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Finishes the rule set.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error recorded by an earlier call.
    pub fn build(self) -> Result<RuleSet, ConfigurationError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(RuleSet {
            allowed_status_codes: self.allowed,
            required_headers: self.required,
            expected_version: self.version,
        })
    }

    fn fail(&mut self, err: ConfigurationError) {
        self.error.get_or_insert(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn empty_builder_is_pass_through() {
        let rules = RuleSet::builder().build().unwrap();
        assert!(rules.is_pass_through());
        assert_eq!(rules, RuleSet::pass_through());
    }

    #[test]
    fn duplicate_status_codes_collapse() {
        let rules = RuleSet::builder()
            .allow_status(204)
            .allow_status(200)
            .allow_status(204)
            .build()
            .unwrap();
        assert_eq!(
            rules.allowed_status_codes().iter().copied().collect::<Vec<_>>(),
            [200, 204]
        );
    }

    #[test]
    fn out_of_range_status_is_rejected() {
        let err = RuleSet::builder().allow_status(42).build().unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidStatusCode { code: 42 });
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let err = RuleSet::builder()
            .require_header("bad header", ["x"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidHeaderName {
                name: "bad header".to_string()
            }
        );
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let err = RuleSet::builder()
            .require_header("x-id", ["line\nbreak"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidHeaderValue {
                name: "x-id".to_string()
            }
        );
    }

    #[test]
    fn empty_value_sequence_is_rejected() {
        let err = RuleSet::builder()
            .require_header("x-id", Vec::<&str>::new())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::EmptyHeaderValues {
                name: "x-id".to_string()
            }
        );
    }

    #[test]
    fn first_configuration_error_is_kept() {
        let err = RuleSet::builder()
            .allow_status(7)
            .require_header("bad header", ["x"])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidStatusCode { code: 7 });
    }

    #[test]
    fn later_header_requirement_replaces_earlier_in_place() {
        let rules = RuleSet::builder()
            .require_header("Accept-Ranges", ["bytes"])
            .require_header("ETag", ["\"v1\""])
            .require_header("accept-ranges", ["none"])
            .build()
            .unwrap();

        let names: Vec<_> = rules
            .required_headers()
            .iter()
            .map(|r| r.name().as_str())
            .collect();
        assert_eq!(names, ["accept-ranges", "etag"]);
        assert_eq!(rules.required_headers()[0].values(), ["none"]);
    }

    #[test]
    fn expect_version_keeps_last_value() {
        let rules = RuleSet::builder()
            .expect_version(Version::HTTP_11)
            .expect_version(Version::HTTP_2)
            .build()
            .unwrap();
        assert_eq!(rules.expected_version(), Some(Version::HTTP_2));
    }

    #[test]
    fn new_matches_builder() {
        let requirement = HeaderRequirement::new(
            HeaderName::from_static("content-type"),
            vec![HeaderValue::from_static("text/html")],
        );
        let rules = RuleSet::new([200, 200, 201], [requirement.clone()], Some(Version::HTTP_2))
            .unwrap();
        let built = RuleSet::builder()
            .allow_status(201)
            .allow_status(200)
            .require(requirement)
            .expect_version(Version::HTTP_2)
            .build()
            .unwrap();
        assert_eq!(rules, built);
    }

    #[test]
    fn requirement_matches_exact_sequence_only() {
        let req = HeaderRequirement::new(
            HeaderName::from_static("vary"),
            vec![
                HeaderValue::from_static("a"),
                HeaderValue::from_static("b"),
            ],
        );
        assert!(req.is_met_by(&headers(&[("Vary", "a"), ("VARY", "b")])));
        assert!(!req.is_met_by(&headers(&[("vary", "b"), ("vary", "a")])));
        assert!(!req.is_met_by(&headers(&[("vary", "a")])));
        assert!(!req.is_met_by(&headers(&[("vary", "a"), ("vary", "b"), ("vary", "c")])));
        assert!(!req.is_met_by(&headers(&[("vary", "a, b")])));
        assert!(!req.is_met_by(&HeaderMap::new()));
    }

    #[test]
    fn requirement_display() {
        let req = HeaderRequirement::new(
            HeaderName::from_static("content-type"),
            vec![HeaderValue::from_static("text/html; charset=utf-8")],
        );
        assert_eq!(
            req.to_string(),
            "content-type: [\"text/html; charset=utf-8\"]"
        );
    }

    #[test]
    fn status_is_checked_before_headers_and_version() {
        let rules = RuleSet::builder()
            .allow_status(200)
            .require_header("x-id", ["1"])
            .expect_version(Version::HTTP_2)
            .build()
            .unwrap();

        let empty = HeaderMap::new();
        let err = rules
            .check(&ResponseMeta::new(500, &empty, Version::HTTP_11))
            .unwrap_err();
        assert_eq!(err.kind(), ViolationKind::StatusCode);

        let err = rules
            .check(&ResponseMeta::new(200, &empty, Version::HTTP_11))
            .unwrap_err();
        assert_eq!(err.kind(), ViolationKind::Header);
    }

    #[test]
    fn first_unmet_header_in_declaration_order_is_reported() {
        let rules = RuleSet::builder()
            .require_header("x-first", ["1"])
            .require_header("x-second", ["2"])
            .build()
            .unwrap();

        let response = headers(&[("x-second", "wrong")]);
        match rules.check(&ResponseMeta::new(200, &response, Version::HTTP_11)) {
            Err(ValidationFailure::Header {
                unmet,
                received,
                required,
            }) => {
                assert_eq!(unmet.name(), "x-first");
                assert_eq!(received, response);
                assert_eq!(required.len(), 2);
            }
            other => panic!("expected header failure, got {:?}", other),
        }
    }

    #[test]
    fn unconstrained_categories_are_skipped() {
        let rules = RuleSet::builder()
            .require_header("x-id", ["1"])
            .build()
            .unwrap();
        let response = headers(&[("x-id", "1"), ("x-extra", "ignored")]);

        for (status, version) in [(200, Version::HTTP_11), (599, Version::HTTP_3)] {
            assert!(rules
                .check(&ResponseMeta::new(status, &response, version))
                .is_ok());
        }
    }

    mod proptests {
        use super::*;
        use crate::test_utils::{arb_headers, arb_status, arb_version};
        use proptest::prelude::*;

        /// Builds a requirement for every header name present in `headers`.
        fn mirror(headers: &HeaderMap) -> RuleSet {
            headers
                .keys()
                .fold(RuleSet::builder(), |builder, name| {
                    builder.require(HeaderRequirement::new(
                        name.clone(),
                        headers.get_all(name).iter().cloned().collect(),
                    ))
                })
                .build()
                .expect("values are never empty")
        }

        proptest! {
            /// Property: an unconstrained rule set accepts any metadata
            #[test]
            fn proptest_pass_through_accepts_everything(
                status in arb_status(),
                headers in arb_headers(),
                version in arb_version()
            ) {
                let meta = ResponseMeta::new(status, &headers, version);
                prop_assert!(RuleSet::pass_through().check(&meta).is_ok());
            }

            /// Property: requiring exactly what the response carries always passes
            #[test]
            fn proptest_mirrored_headers_pass(headers in arb_headers(), version in arb_version()) {
                let rules = mirror(&headers);
                let meta = ResponseMeta::new(200, &headers, version);
                prop_assert!(rules.check(&meta).is_ok());
            }

            /// Property: a status outside the allowed set is always reported as such
            #[test]
            fn proptest_disallowed_status_is_reported(
                allowed in prop::collection::btree_set(arb_status(), 1..5),
                status in arb_status(),
                headers in arb_headers()
            ) {
                prop_assume!(!allowed.contains(&status));
                let rules = allowed
                    .iter()
                    .fold(RuleSet::builder(), |b, code| b.allow_status(*code))
                    .require_header("x-never-sent", ["1"])
                    .build()
                    .unwrap();

                let err = rules
                    .check(&ResponseMeta::new(status, &headers, Version::HTTP_11))
                    .unwrap_err();
                prop_assert_eq!(
                    err,
                    ValidationFailure::StatusCode { received: status, allowed }
                );
            }
        }
    }
}
