use http::{response::Parts, HeaderMap, Response, Version};

/// Metadata of a response whose body has not been read yet.
///
/// Holds the status code, headers and protocol version as the transport
/// reports them. Headers are borrowed: a `ResponseMeta` only lives for the
/// duration of one validation call and never outlives the response it
/// describes.
///
/// # Examples
///
/// ```
/// use response_gate::ResponseMeta;
/// use http::{HeaderMap, Version};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("content-type", "text/plain".parse().unwrap());
///
/// let meta = ResponseMeta::new(200, &headers, Version::HTTP_2);
/// assert_eq!(meta.status(), 200);
/// assert_eq!(meta.version(), Version::HTTP_2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ResponseMeta<'a> {
    status: u16,
    headers: &'a HeaderMap,
    version: Version,
}

impl<'a> ResponseMeta<'a> {
    /// Creates response metadata from its raw components.
    pub fn new(status: u16, headers: &'a HeaderMap, version: Version) -> Self {
        Self {
            status,
            headers,
            version,
        }
    }

    /// Borrows the metadata of a response without touching its body.
    ///
    /// ```
    /// use response_gate::ResponseMeta;
    ///
    /// let response = http::Response::builder()
    ///     .status(201)
    ///     .header("location", "/items/7")
    ///     .body(())
    ///     .unwrap();
    ///
    /// let meta = ResponseMeta::from_response(&response);
    /// assert_eq!(meta.status(), 201);
    /// assert!(meta.headers().contains_key("location"));
    /// ```
    pub fn from_response<B>(response: &'a Response<B>) -> Self {
        Self::new(
            response.status().as_u16(),
            response.headers(),
            response.version(),
        )
    }

    /// Numeric status code, e.g. `200`.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers; names are case-insensitive and repeated names keep
    /// their values in arrival order.
    pub fn headers(&self) -> &'a HeaderMap {
        self.headers
    }

    /// Protocol version the response was received with.
    pub fn version(&self) -> Version {
        self.version
    }
}

impl<'a> From<&'a Parts> for ResponseMeta<'a> {
    fn from(parts: &'a Parts) -> Self {
        Self::new(parts.status.as_u16(), &parts.headers, parts.version)
    }
}
