//! HTTP primitives for outbound requests.
//!
//! This module provides the core types a fetch operation is described with:
//! [`Method`], [`Headers`], [`Request`], [`RequestOptions`], and [`Response`].

use std::fmt;

pub mod headers;
pub mod request;
pub mod response;
mod url;

pub use headers::Headers;
pub use request::{Credentials, Mode, Request, RequestError, RequestIdentity, RequestOptions};
pub use response::Response;

/// An HTTP request method in canonical (uppercase) form.
///
/// Standard methods are represented as unit variants for zero-cost comparison.
/// Non-standard methods are captured in the `Custom` variant, uppercased.
/// Parsing folds case, so `"get"`, `"Get"` and `"GET"` all produce the same
/// value — differently-cased spellings of one method are one method as far
/// as request identity is concerned.
///
/// # Examples
///
/// ```
/// use coalesce::http::Method;
///
/// let method: Method = "get".parse().unwrap();
/// assert_eq!(method, Method::Get);
/// assert_eq!(method.as_str(), "GET");
/// assert!(method.is_safe());
/// assert!(method.is_idempotent());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET — retrieve a representation of the target resource.
    Get,
    /// POST — perform resource-specific processing on the request payload.
    Post,
    /// PUT — replace the target resource's current representation.
    Put,
    /// DELETE — remove the association between the target resource and its functionality.
    Delete,
    /// HEAD — identical to GET but without a response body.
    Head,
    /// OPTIONS — describe the communication options for the target resource.
    Options,
    /// PATCH — apply partial modifications to a resource.
    Patch,
    /// CONNECT — establish a tunnel to the server identified by the target resource.
    Connect,
    /// TRACE — perform a message loop-back test along the path to the target resource.
    Trace,
    /// A non-standard extension method, stored uppercase.
    Custom(String),
}

impl Method {
    /// Returns the method as an uppercase string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Custom(s) => s.as_str(),
        }
    }

    /// Returns `true` if this method is considered "safe" (no side effects per RFC 9110 §9.2.1).
    ///
    /// Safe methods: GET, HEAD, OPTIONS, TRACE.
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options | Self::Trace)
    }

    /// Returns `true` if this method is idempotent (RFC 9110 §9.2.2).
    ///
    /// Idempotent methods: GET, HEAD, PUT, DELETE, OPTIONS, TRACE.
    /// The default set of coalescable methods is drawn from these — repeating
    /// an idempotent request is what makes sharing one in-flight response sound.
    pub fn is_idempotent(&self) -> bool {
        matches!(
            self,
            Self::Get | Self::Head | Self::Put | Self::Delete | Self::Options | Self::Trace
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "PATCH" => Self::Patch,
            "CONNECT" => Self::Connect,
            "TRACE" => Self::Trace,
            other => Self::Custom(other.to_owned()),
        })
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_folds_case() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("delete".parse::<Method>().unwrap(), Method::Delete);
    }

    #[test]
    fn custom_is_uppercased() {
        let m: Method = "purge".parse().unwrap();
        assert_eq!(m, Method::Custom(String::from("PURGE")));
        assert_eq!(m.as_str(), "PURGE");
    }

    #[test]
    fn idempotent_set() {
        for m in ["GET", "HEAD", "PUT", "DELETE", "OPTIONS", "TRACE"] {
            assert!(m.parse::<Method>().unwrap().is_idempotent(), "{m}");
        }
        for m in ["POST", "PATCH", "CONNECT"] {
            assert!(!m.parse::<Method>().unwrap().is_idempotent(), "{m}");
        }
    }
}
