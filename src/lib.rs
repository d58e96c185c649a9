//! # coalesce
//!
//! A request-coalescing decorator for async fetch operations.
//!
//! Wrap any transport — anything implementing [`Fetch`] — and concurrent
//! identical requests collapse into a single in-flight call: one transport
//! invocation, with every caller receiving an independent clone of the one
//! result. The moment a request settles it leaves the in-flight table, so
//! nothing is ever served stale; this is deduplication of concurrency, not
//! a response cache.
//!
//! ## Quick Start
//!
//! ```rust
//! use coalesce::{Coalesceable, fetch_fn};
//! use coalesce::http::{Request, Response};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let transport = fetch_fn(|_request: Request| async {
//!     // ... perform the actual network call ...
//!     Ok::<_, std::convert::Infallible>(Response::new(200).body("hello"))
//! });
//! let coalesced = transport.coalesced();
//!
//! // Issued concurrently, these share one transport call.
//! let (a, b) = tokio::join!(
//!     coalesced.fetch(Request::new("https://example.com/greeting")?),
//!     coalesced.fetch(Request::new("https://example.com/greeting")?),
//! );
//! assert_eq!(a.unwrap().text(), b.unwrap().text());
//! # Ok::<(), coalesce::http::RequestError>(())
//! # });
//! ```
//!
//! By default only idempotent methods (OPTIONS, GET, HEAD, PUT, DELETE) are
//! coalesced; anything else goes straight through to the transport. Use
//! [`Coalescer::methods`] to configure a different set.

pub mod coalesce;
pub mod fetch;
pub mod http;

pub use coalesce::{Coalesceable, Coalesced, Coalescer};
pub use fetch::{Fetch, FetchFn, fetch_fn};
pub use http::{Headers, Method, Request, RequestOptions, Response};
