//! The transport abstraction the decorator wraps.
//!
//! Anything that can turn a [`Request`] into an async result can be wrapped:
//! implement [`Fetch`] directly, or use [`fetch_fn`] to adapt a plain async
//! closure. The decorator in [`crate::coalesce`] is itself a `Fetch`, so
//! wrapped transports compose like any other.

use std::future::Future;

use crate::http::Request;

/// An asynchronous fetch operation.
///
/// The response type is whatever the transport produces; the coalescing
/// decorator additionally requires it (and the error type) to be [`Clone`],
/// which is how one in-flight result is handed out as independent copies to
/// every concurrent caller.
///
/// # Examples
///
/// ```
/// use coalesce::{Fetch, fetch_fn};
/// use coalesce::http::{Request, Response};
///
/// let transport = fetch_fn(|request: Request| async move {
///     Ok::<_, std::convert::Infallible>(Response::new(200).body(request.url().to_owned()))
/// });
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let response = transport.fetch(Request::new("/a").unwrap()).await.unwrap();
/// assert_eq!(response.text(), "/a");
/// # });
/// ```
pub trait Fetch {
    /// The response-like value a successful fetch produces.
    type Response;

    /// The rejection reason a failed fetch produces.
    type Error;

    /// Performs the fetch.
    fn fetch(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send;
}

/// Adapts a plain async closure into a [`Fetch`] implementation.
///
/// See [`fetch_fn`].
pub struct FetchFn<F>(F);

/// Wraps `f` so it can serve as a transport.
///
/// `f` receives the canonical [`Request`] and returns a future resolving to
/// the transport's result.
pub fn fetch_fn<F, Fut, T, E>(f: F) -> FetchFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
{
    FetchFn(f)
}

impl<F, Fut, T, E> Fetch for FetchFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
{
    type Response = T;
    type Error = E;

    fn fetch(&self, request: Request) -> impl Future<Output = Result<T, E>> + Send {
        (self.0)(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;

    #[tokio::test]
    async fn closure_adapter_forwards_request() {
        let transport = fetch_fn(|request: Request| async move {
            Ok::<_, std::convert::Infallible>(
                Response::new(200).body(format!("{} {}", request.method(), request.url())),
            )
        });
        let response = transport.fetch(Request::new("/ping").unwrap()).await.unwrap();
        assert_eq!(response.text(), "GET /ping");
    }
}
