use crate::metadata::ResponseMeta;

/// A strategy that turns response metadata into a body consumer.
///
/// This is the seam between the validator and whatever actually reads the
/// body (discard it, decode it as text, stream it to a sink). The transport
/// calls `handle` once per response, after the status line and headers have
/// arrived and before any body bytes are delivered.
///
/// Any `Fn(&ResponseMeta<'_>) -> C` closure is a handler.
///
/// # Examples
///
/// ```
/// use response_gate::{BodyHandler, ResponseMeta};
/// use http::{HeaderMap, Version};
///
/// struct Discarding;
///
/// impl BodyHandler for Discarding {
///     type Consumer = ();
///
///     fn handle(&self, _meta: &ResponseMeta<'_>) -> Self::Consumer {}
/// }
///
/// let headers = HeaderMap::new();
/// Discarding.handle(&ResponseMeta::new(204, &headers, Version::HTTP_11));
///
/// let sized = |meta: &ResponseMeta<'_>| meta.headers().contains_key("content-length");
/// assert!(!sized.handle(&ResponseMeta::new(204, &headers, Version::HTTP_11)));
/// ```
pub trait BodyHandler {
    /// The body consumer produced for a response.
    type Consumer;

    /// Produces the body consumer for a response with the given metadata.
    fn handle(&self, meta: &ResponseMeta<'_>) -> Self::Consumer;
}

impl<F, C> BodyHandler for F
where
    F: Fn(&ResponseMeta<'_>) -> C,
{
    type Consumer = C;

    fn handle(&self, meta: &ResponseMeta<'_>) -> C {
        self(meta)
    }
}
