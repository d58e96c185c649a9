//! Request coalescing: at most one in-flight transport call per identical request.
//!
//! [`Coalescer`] binds configuration (which methods are eligible);
//! [`Coalescer::wrap`] applies it to a transport, producing a [`Coalesced`]
//! decorator with its own empty in-flight table. While a request is in
//! flight, every further call with the same canonical URL and the same
//! [`RequestIdentity`] joins it instead of reaching the transport; each
//! joiner receives an independent clone of the one eventual result. The
//! moment the underlying call settles — fulfilled or failed — its table
//! entry is removed, so outcomes are shared only within a flight, never
//! across flights.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::fetch::Fetch;
use crate::http::{Method, Request, RequestIdentity};

/// Methods eligible for coalescing by default: the idempotent methods
/// (minus TRACE), for which handing several callers one shared outcome is
/// indistinguishable from issuing the request several times.
const DEFAULT_METHODS: [Method; 5] = [
    Method::Options,
    Method::Get,
    Method::Head,
    Method::Put,
    Method::Delete,
];

/// Configuration for the coalescing decorator.
///
/// A `Coalescer` holds no request state and may be reused: every call to
/// [`wrap`](Self::wrap) produces a decorator with an independent, empty
/// in-flight table.
///
/// # Examples
///
/// ```
/// use coalesce::{Coalescer, fetch_fn};
/// use coalesce::http::{Request, Response};
///
/// let transport = fetch_fn(|_req: Request| async {
///     Ok::<_, std::convert::Infallible>(Response::new(200))
/// });
/// let coalesced = Coalescer::new().wrap(transport);
/// ```
#[derive(Debug, Clone)]
pub struct Coalescer {
    methods: Vec<Method>,
}

impl Coalescer {
    /// Creates a configuration with the default method set:
    /// OPTIONS, GET, HEAD, PUT, DELETE.
    pub fn new() -> Self {
        Self {
            methods: DEFAULT_METHODS.to_vec(),
        }
    }

    /// Creates a configuration coalescing exactly the given methods.
    ///
    /// Names are compared case-insensitively; `["get", "Head"]` and
    /// `["GET", "HEAD"]` configure the same set. Methods outside the set
    /// always bypass the decorator.
    pub fn methods<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            methods: methods
                .into_iter()
                .map(|m| m.as_ref().parse().unwrap()) // Infallible
                .collect(),
        }
    }

    /// Applies this configuration to a transport.
    ///
    /// Each application creates an independent decorator — no in-flight
    /// state is shared between the results of two `wrap` calls, even from
    /// the same `Coalescer`.
    pub fn wrap<F>(&self, inner: F) -> Coalesced<F>
    where
        F: Fetch,
    {
        Coalesced {
            inner,
            methods: self.methods.clone(),
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for Coalescer {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps any [`Fetch`] in a default-configured [`Coalesced`] decorator.
///
/// # Examples
///
/// ```
/// use coalesce::{Coalesceable, fetch_fn};
/// use coalesce::http::{Request, Response};
///
/// let coalesced = fetch_fn(|_req: Request| async {
///     Ok::<_, std::convert::Infallible>(Response::new(200))
/// })
/// .coalesced();
/// ```
pub trait Coalesceable: Fetch + Sized {
    /// Equivalent to `Coalescer::new().wrap(self)`.
    fn coalesced(self) -> Coalesced<Self>;
}

impl<F> Coalesceable for F
where
    F: Fetch,
    F::Response: Clone + Send,
    F::Error: Clone + Send,
{
    fn coalesced(self) -> Coalesced<Self> {
        Coalescer::new().wrap(self)
    }
}

/// The settlement shared between all callers of one in-flight request.
type Settlement<F> = Result<<F as Fetch>::Response, <F as Fetch>::Error>;

/// One in-flight transport call, registered under its canonical URL.
///
/// The invariant for a URL's entry list: no two entries carry structurally
/// equal identities. The lookup-then-insert under a single lock acquisition
/// in [`Coalesced::fetch`] is what enforces it.
struct InFlightEntry<F: Fetch> {
    identity: RequestIdentity,
    tx: broadcast::Sender<Settlement<F>>,
}

type InFlightTable<F> = HashMap<String, Vec<InFlightEntry<F>>>;

/// A transport decorated with request coalescing.
///
/// Signature-compatible with the transport it wraps — `Coalesced<F>` is
/// itself a [`Fetch`] — so decorated transports compose and substitute
/// freely.
pub struct Coalesced<F: Fetch> {
    inner: F,
    methods: Vec<Method>,
    inflight: Mutex<InFlightTable<F>>,
}

/// What the table lookup decided for one call.
enum Role<T> {
    /// First caller: owns the transport call and must settle the entry.
    Leader(broadcast::Sender<T>),
    /// Subsequent caller: awaits the leader's settlement.
    Waiter(broadcast::Receiver<T>),
}

impl<F> Coalesced<F>
where
    F: Fetch + Send + Sync,
    F::Response: Clone + Send,
    F::Error: Clone + Send,
{
    /// Performs `request`, sharing an in-flight transport call when an
    /// identical request is already running.
    ///
    /// Requests whose method is outside the configured set are forwarded to
    /// the transport untouched and untracked, one transport call per caller.
    /// For eligible methods: the first caller for a given (canonical URL,
    /// identity) pair invokes the transport; everyone who arrives while that
    /// call is in flight receives an independent clone of its outcome —
    /// fulfillment and rejection alike. A caller arriving after settlement
    /// always starts a fresh transport call.
    ///
    /// # Errors
    ///
    /// Whatever the transport produced, unchanged. Shared rejections reach
    /// every waiter as clones of the original error.
    pub async fn fetch(&self, request: Request) -> Result<F::Response, F::Error> {
        if !self.methods.contains(request.method()) {
            trace!(
                method = %request.method(),
                url = %request.url(),
                "method not coalescable, forwarding"
            );
            return self.inner.fetch(request).await;
        }

        let key = request.url().to_owned();
        let identity = request.identity();

        // Lookup and registration happen under one lock acquisition, so no
        // second entry with this identity can appear in between.
        let role = {
            let mut inflight = lock(&self.inflight);
            let entries = inflight.entry(key.clone()).or_default();
            match entries.iter().find(|entry| entry.identity == identity) {
                Some(entry) => Role::Waiter(entry.tx.subscribe()),
                None => {
                    let (tx, _) = broadcast::channel(1);
                    entries.push(InFlightEntry {
                        identity: identity.clone(),
                        tx: tx.clone(),
                    });
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Waiter(mut rx) => {
                trace!(url = %key, "joining in-flight request");
                match rx.recv().await {
                    Ok(settlement) => settlement,
                    // The leading call was dropped before settling and its
                    // entry is already gone; fall back to a direct call.
                    Err(_) => self.inner.fetch(request).await,
                }
            }
            Role::Leader(tx) => {
                debug!(method = %request.method(), url = %key, "starting in-flight request");
                let guard = SettleGuard {
                    inflight: &self.inflight,
                    key: &key,
                    identity: &identity,
                };
                let result = self.inner.fetch(request).await;
                // Settle: the entry must be gone before any waiter wakes, so
                // a call arriving from here on starts a fresh flight.
                drop(guard);
                let waiters = tx.receiver_count();
                if waiters > 0 {
                    debug!(url = %key, waiters, "in-flight request settled, notifying waiters");
                    let _ = tx.send(result.clone());
                } else {
                    debug!(url = %key, "in-flight request settled");
                }
                result
            }
        }
    }
}

impl<F> Fetch for Coalesced<F>
where
    F: Fetch + Send + Sync,
    F::Response: Clone + Send,
    F::Error: Clone + Send,
{
    type Response = F::Response;
    type Error = F::Error;

    fn fetch(
        &self,
        request: Request,
    ) -> impl std::future::Future<Output = Result<F::Response, F::Error>> + Send {
        Coalesced::fetch(self, request)
    }
}

/// Removes the leader's entry exactly once, on settlement or on cancellation.
///
/// Removal targets the entry by identity match, the same rule the lookup
/// uses; only one entry per key can match, so the retain is precise. Running
/// this from `Drop` also covers the leader's future being dropped mid-flight,
/// which would otherwise leave a dead entry pinned in the table.
struct SettleGuard<'a, F: Fetch> {
    inflight: &'a Mutex<InFlightTable<F>>,
    key: &'a str,
    identity: &'a RequestIdentity,
}

impl<F: Fetch> Drop for SettleGuard<'_, F> {
    fn drop(&mut self) {
        let mut inflight = lock(self.inflight);
        if let Some(entries) = inflight.get_mut(self.key) {
            entries.retain(|entry| entry.identity != *self.identity);
            if entries.is_empty() {
                inflight.remove(self.key);
            }
        }
    }
}

/// The table lock is only ever held for synchronous map edits, so a poisoned
/// lock can only mean a panic mid-edit in this module; the map is still
/// structurally sound and safe to reuse.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
