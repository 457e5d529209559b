//! Proptest strategies shared by the unit tests.

use http::{HeaderMap, HeaderName, HeaderValue, Version};
use proptest::prelude::*;

/// Lowercase header names made of token characters.
pub(crate) fn arb_header_name() -> impl Strategy<Value = HeaderName> {
    "[a-z][a-z0-9-]{0,15}"
        .prop_map(|s| HeaderName::from_bytes(s.as_bytes()).expect("token characters only"))
}

/// Visible ASCII header values, never empty.
pub(crate) fn arb_header_value() -> impl Strategy<Value = HeaderValue> {
    "[a-zA-Z0-9;=/.,-][a-zA-Z0-9 ;=/.,-]{0,19}"
        .prop_map(|s| HeaderValue::from_str(&s).expect("visible ASCII only"))
}

/// Header maps with up to six names, each carrying one to three values.
pub(crate) fn arb_headers() -> impl Strategy<Value = HeaderMap> {
    prop::collection::vec(
        (
            arb_header_name(),
            prop::collection::vec(arb_header_value(), 1..4),
        ),
        0..6,
    )
    .prop_map(|entries| {
        let mut map = HeaderMap::new();
        for (name, values) in entries {
            for value in values {
                map.append(name.clone(), value);
            }
        }
        map
    })
}

pub(crate) fn arb_version() -> impl Strategy<Value = Version> {
    prop_oneof![
        Just(Version::HTTP_09),
        Just(Version::HTTP_10),
        Just(Version::HTTP_11),
        Just(Version::HTTP_2),
        Just(Version::HTTP_3),
    ]
}

pub(crate) fn arb_status() -> impl Strategy<Value = u16> {
    100u16..600
}
