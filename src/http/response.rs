//! Response type for fetch results.
//!
//! A transport can return any cloneable type; this one is provided for
//! transports that do not bring their own. Its `Clone` is cheap and
//! side-effect-free — the body is a refcounted [`Bytes`] buffer — which is
//! exactly the clone behavior the coalescing layer relies on when it hands
//! each concurrent caller an independent copy of one shared result.

use bytes::Bytes;

use super::Headers;

/// A fetched HTTP response: status, headers, and a fully buffered body.
///
/// # Examples
///
/// ```
/// use coalesce::http::Response;
///
/// let response = Response::new(200)
///     .header("Content-Type", "application/json")
///     .body(r#"{"status":"ok"}"#);
///
/// assert!(response.ok());
/// assert_eq!(response.text(), r#"{"status":"ok"}"#);
///
/// let copy = response.clone();
/// assert_eq!(copy.status(), response.status());
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Bytes,
}

impl Response {
    /// Creates a response with the given status code and an empty body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the response body from a string.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Bytes::from(body.into().into_bytes());
        self
    }

    /// Sets the response body from raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns `true` if the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the raw body bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(Response::new(200).ok());
        assert!(Response::new(204).ok());
        assert!(!Response::new(304).ok());
        assert!(!Response::new(404).ok());
        assert!(!Response::new(500).ok());
    }

    #[test]
    fn builder_round_trip() {
        let r = Response::new(201)
            .header("Location", "/items/7")
            .body("created");
        assert_eq!(r.status(), 201);
        assert_eq!(r.headers().get("location"), Some("/items/7"));
        assert_eq!(r.text(), "created");
    }

    #[test]
    fn clones_are_independent_views() {
        let original = Response::new(200).body("shared");
        let copy = original.clone();
        drop(original);
        assert_eq!(copy.text(), "shared");
    }
}
