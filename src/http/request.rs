//! Outbound request construction and normalization.
//!
//! [`Request::with_options`] plays the role a standard request constructor
//! does in a fetch stack: it resolves the URL to a canonical form, defaults
//! the method to GET, folds the method to uppercase, and rejects input that
//! could never become a valid request. Everything downstream (the coalescing
//! layer, the transport) works with the canonical [`Request`] it produces.

use bytes::Bytes;
use thiserror::Error;

use super::url::canonicalize;
use super::{Headers, Method};

/// Errors a request constructor can produce.
///
/// These occur before any transport is involved; the coalescing layer itself
/// never adds error kinds of its own.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request URL is empty")]
    EmptyUrl,

    #[error("invalid request URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid HTTP method token: {method:?}")]
    InvalidMethod { method: String },
}

/// The credentials policy attached to a request.
///
/// Part of request identity: two otherwise identical requests with different
/// credentials policies are different requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credentials {
    /// Never send credentials.
    Omit,
    /// Send credentials for same-origin requests only (the fetch default).
    #[default]
    SameOrigin,
    /// Always send credentials.
    Include,
}

/// The request mode, governing how cross-origin requests behave.
///
/// Part of request identity, like [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Cross-origin requests allowed, subject to CORS (the fetch default).
    #[default]
    Cors,
    /// Cross-origin requests allowed but the response is opaque.
    NoCors,
    /// Cross-origin requests are an error.
    SameOrigin,
    /// Navigation requests.
    Navigate,
}

/// The options bag accepted alongside a URL, fetch-style.
///
/// Every field is optional; an empty bag means a plain GET with no headers
/// and no body.
///
/// # Examples
///
/// ```
/// use coalesce::http::{Request, RequestOptions};
///
/// let options = RequestOptions::new()
///     .method("put")
///     .header("Content-Type", "application/json")
///     .body(r#"{"v":1}"#);
/// let request = Request::with_options("http://example.com/items/7", options).unwrap();
///
/// assert_eq!(request.method().as_str(), "PUT");
/// assert_eq!(request.url(), "http://example.com/items/7");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    method: Option<String>,
    headers: Headers,
    body: Option<Bytes>,
    credentials: Credentials,
    mode: Mode,
}

impl RequestOptions {
    /// Creates an empty options bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method. Case-insensitive; absent means GET.
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Appends a request header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces the header map wholesale.
    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the request body from a string.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Bytes::from(body.into().into_bytes()));
        self
    }

    /// Sets the request body from raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the credentials policy.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the request mode.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// A canonical outbound request, ready to hand to a transport.
///
/// Created by [`Request::new`] or [`Request::with_options`]. The URL and
/// method are already normalized, so two `Request`s describing the same
/// operation compare equal through [`identity`](Self::identity) no matter how
/// the caller spelled them.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    headers: Headers,
    body: Option<Bytes>,
    credentials: Credentials,
    mode: Mode,
}

impl Request {
    /// Constructs a GET request for `url` with no headers and no body.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the URL is empty or malformed.
    pub fn new(url: impl AsRef<str>) -> Result<Self, RequestError> {
        Self::with_options(url, RequestOptions::default())
    }

    /// Constructs a request for `url` from a fetch-style options bag.
    ///
    /// The URL is canonicalized (scheme/host case, default port, fragment),
    /// the method defaults to GET and is folded to uppercase.
    ///
    /// # Errors
    ///
    /// - [`RequestError::EmptyUrl`] / [`RequestError::InvalidUrl`] — the URL
    ///   cannot be canonicalized.
    /// - [`RequestError::InvalidMethod`] — the method is empty or contains
    ///   characters outside the RFC 9110 token set.
    pub fn with_options(
        url: impl AsRef<str>,
        options: RequestOptions,
    ) -> Result<Self, RequestError> {
        let url = canonicalize(url.as_ref())?;

        let method = match options.method {
            None => Method::Get,
            Some(raw) => {
                if raw.is_empty() || !raw.bytes().all(is_token_byte) {
                    return Err(RequestError::InvalidMethod { method: raw });
                }
                raw.parse().unwrap() // Infallible
            }
        };

        Ok(Self {
            method,
            url,
            headers: options.headers,
            body: options.body,
            credentials: options.credentials,
            mode: options.mode,
        })
    }

    /// Returns the HTTP method (always uppercase).
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the canonical URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the credentials policy.
    pub fn credentials(&self) -> Credentials {
        self.credentials
    }

    /// Returns the request mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the identity-relevant projection of this request.
    ///
    /// Two requests with equal identities (and equal URLs) describe the same
    /// operation and may share one in-flight transport call.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity {
            method: self.method.clone(),
            headers: self.headers.normalized(),
            body: self.body.clone(),
            credentials: self.credentials,
            mode: self.mode,
        }
    }
}

/// The subset of request fields significant to request identity, in a
/// canonical, order-independent form.
///
/// Structural equality over this type is the rule for matching an in-flight
/// request: method (uppercase), headers (sorted, lowercased names), body
/// bytes, credentials policy, and mode. The URL is not included here because
/// it serves as the cache key itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    method: Method,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    credentials: Credentials,
    mode: Mode,
}

/// RFC 9110 §5.6.2 token characters, the legal alphabet for method names.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_method_is_get() {
        let req = Request::new("/a").unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert!(req.body().is_none());
        assert!(req.headers().is_empty());
    }

    #[test]
    fn method_folded_to_uppercase() {
        let req = Request::with_options("/a", RequestOptions::new().method("get")).unwrap();
        assert_eq!(req.method(), &Method::Get);
    }

    #[test]
    fn invalid_method_rejected() {
        for method in ["", "GE T", "GET\r\n", "GET/1"] {
            let result = Request::with_options("/a", RequestOptions::new().method(method));
            assert!(
                matches!(result, Err(RequestError::InvalidMethod { .. })),
                "{method:?}"
            );
        }
    }

    #[test]
    fn url_is_canonicalized() {
        let req = Request::new("HTTP://Example.com:80").unwrap();
        assert_eq!(req.url(), "http://example.com/");
    }

    #[test]
    fn identity_ignores_cosmetics() {
        let a = Request::with_options(
            "http://Example.com/a",
            RequestOptions::new()
                .method("get")
                .header("Accept", "*/*")
                .header("X-Trace", "1"),
        )
        .unwrap();
        let b = Request::with_options(
            "http://example.com:80/a",
            RequestOptions::new()
                .method("GET")
                .header("x-trace", "1")
                .header("ACCEPT", "*/*"),
        )
        .unwrap();
        assert_eq!(a.url(), b.url());
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn identity_sees_material_differences() {
        let base = Request::new("/a").unwrap();

        let other_method =
            Request::with_options("/a", RequestOptions::new().method("HEAD")).unwrap();
        assert_ne!(base.identity(), other_method.identity());

        let with_header =
            Request::with_options("/a", RequestOptions::new().header("Accept", "*/*")).unwrap();
        assert_ne!(base.identity(), with_header.identity());

        let with_body = Request::with_options("/a", RequestOptions::new().body("x")).unwrap();
        assert_ne!(base.identity(), with_body.identity());

        let with_credentials = Request::with_options(
            "/a",
            RequestOptions::new().credentials(Credentials::Include),
        )
        .unwrap();
        assert_ne!(base.identity(), with_credentials.identity());

        let with_mode =
            Request::with_options("/a", RequestOptions::new().mode(Mode::NoCors)).unwrap();
        assert_ne!(base.identity(), with_mode.identity());
    }
}
