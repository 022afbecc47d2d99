//! Request Deduplication
//!
//! Collapses concurrent calls for the same key into one execution whose
//! result is handed to every caller.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use parking_lot::Mutex;

type Call<T> = Shared<BoxFuture<'static, T>>;
type Calls<T> = Arc<Mutex<HashMap<String, Record<T>>>>;

/// Registry entry for an in-flight call. Only waiters keep the call alive.
struct Record<T> {
    id: u64,
    call: WeakShared<BoxFuture<'static, T>>,
}

// == Single Flight ==
/// Deduplicates in-flight work by key.
///
/// The first caller for a key registers a shared future; callers arriving
/// while it runs await the same future instead of starting their own. The
/// record is dropped as soon as the work completes, so a later call starts a
/// fresh execution. Results are never retained beyond that.
///
/// The work is driven by whichever waiter polls it. If every waiter is
/// dropped, the work is cancelled and its record removed, so the next call
/// starts over.
pub struct SingleFlight<T> {
    calls: Calls<T>,
    next_id: AtomicU64,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    // == Work ==
    /// Runs `f` for `key` unless a call for `key` is already in flight, in
    /// which case its result is awaited instead.
    ///
    /// Returns the result and whether this caller joined an existing call.
    pub async fn work<F, Fut>(&self, key: &str, f: F) -> (T, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (call, shared) = {
            let mut calls = self.calls.lock();
            match calls.get(key).and_then(|record| record.call.upgrade()) {
                Some(call) => (call, true),
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let call = Self::register(Arc::clone(&self.calls), key.to_string(), id, f());
                    if let Some(weak) = call.downgrade() {
                        calls.insert(key.to_string(), Record { id, call: weak });
                    }
                    (call, false)
                }
            }
        };

        (call.await, shared)
    }

    /// Whether a call for `key` is currently registered.
    pub fn in_flight(&self, key: &str) -> bool {
        self.calls.lock().contains_key(key)
    }

    fn register<Fut>(calls: Calls<T>, key: String, id: u64, work: Fut) -> Call<T>
    where
        Fut: Future<Output = T> + Send + 'static,
    {
        let unregister = Unregister { calls, key, id };
        async move {
            let _unregister = unregister;
            work.await
        }
        .boxed()
        .shared()
    }
}

/// Removes its call's record when the call completes or is dropped unpolled
/// by its last waiter.
struct Unregister<T> {
    calls: Calls<T>,
    key: String,
    id: u64,
}

impl<T> Drop for Unregister<T> {
    fn drop(&mut self) {
        let mut calls = self.calls.lock();
        // A newer call may already own the key.
        if calls.get(&self.key).is_some_and(|record| record.id == self.id) {
            calls.remove(&self.key);
        }
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.calls.lock().len())
            .finish()
    }
}
