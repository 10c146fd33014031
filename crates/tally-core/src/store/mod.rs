//! Cached entity stores over remote collections
//!
//! An `EntityStore` wraps a `Fetcher` and keeps the last successful result
//! together with loading/error bookkeeping, so many consumers can share one
//! copy of a collection.
//!
//! # Architecture
//!
//! - `Fetcher` trait: anything that can load a collection snapshot
//! - `EntityStore`: the cache, cheap to clone (all clones share state)
//! - Fetcher implementations: `JsonFileFetcher`, `RestCollectionFetcher`,
//!   `FnFetcher`, `StaticFetcher`, and `CheckedFetcher` to validate any of them
//!
//! # State machine
//!
//! `Idle -> Loading -> Ready | Errored`. From `Ready`/`Errored` a refresh goes
//! back through `Loading`. `reset_store` returns to `Idle` from anywhere.
//!
//! At most one fetch per store is in flight. The in-flight check and the flag
//! update happen under one lock with no await in between; a second refresh
//! while one is running returns `RefreshOutcome::Skipped` without calling the
//! fetcher. A response arriving after `reset_store` is discarded.
//!
//! # Usage
//!
//! ```rust,ignore
//! let store = EntityStore::new("transactions", JsonFileFetcher::in_dir(dir, "transactions"));
//! store.ensure_loaded().await;
//! if let Some(transactions) = store.peek() {
//!     println!("{} transactions", transactions.len());
//! }
//! ```

mod fetcher;
mod json_file;
mod rest;

pub use fetcher::{CheckedFetcher, Fetcher, FnFetcher, StaticFetcher};
pub use json_file::JsonFileFetcher;
pub use rest::{RestClient, RestCollectionFetcher};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::Error;

/// Snapshot of a store's state
#[derive(Debug, Clone)]
pub struct StoreState<T, X = ()> {
    /// Last successfully fetched value; kept when a later fetch fails
    pub data: Option<T>,
    pub is_loading: bool,
    pub is_fetched: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Identity the data was fetched for
    pub fetched_by: Option<String>,
    pub error: Option<Arc<Error>>,
    /// Caller-defined extra state, restored on reset
    pub extra: X,
}

impl<T, X> StoreState<T, X> {
    fn initial(extra: X) -> Self {
        Self {
            data: None,
            is_loading: false,
            is_fetched: false,
            fetched_at: None,
            fetched_by: None,
            error: None,
            extra,
        }
    }
}

/// What a refresh call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetcher succeeded and the data was stored
    Fetched,
    /// The fetcher failed; the error was stored, the data kept
    Failed,
    /// Another fetch was already in flight; the fetcher was not called
    Skipped,
    /// The store was reset while fetching; the response was dropped
    Discarded,
    /// Data was already loaded; nothing to do
    Cached,
}

struct Shared<T, X> {
    state: StoreState<T, X>,
    in_flight: bool,
    /// Bumped on reset so late responses can be recognized
    generation: u64,
    identity: Option<String>,
}

struct Inner<T, X> {
    name: String,
    fetcher: Arc<dyn Fetcher<T>>,
    initial_extra: X,
    shared: Mutex<Shared<T, X>>,
    version: watch::Sender<u64>,
}

impl<T, X> Inner<T, X> {
    fn lock(&self) -> MutexGuard<'_, Shared<T, X>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

/// Clears the in-flight flag if a refresh future is dropped before the
/// fetcher returns
struct InFlightGuard<'a, T, X> {
    inner: &'a Inner<T, X>,
    generation: u64,
    armed: bool,
}

impl<T, X> Drop for InFlightGuard<'_, T, X> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut shared = self.inner.lock();
        if shared.generation == self.generation {
            shared.in_flight = false;
            shared.state.is_loading = false;
            drop(shared);
            debug!(store = %self.inner.name, "Fetch cancelled");
            self.inner.notify();
        }
    }
}

/// Cached wrapper around a `Fetcher`
pub struct EntityStore<T, X = ()> {
    inner: Arc<Inner<T, X>>,
}

impl<T, X> Clone for EntityStore<T, X> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> EntityStore<T, ()>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, fetcher: impl Fetcher<T> + 'static) -> Self {
        Self::with_extra(name, fetcher, ())
    }
}

impl<T, X> EntityStore<T, X>
where
    T: Clone + Send + Sync + 'static,
    X: Clone + Send + Sync + 'static,
{
    /// Create a store carrying extra caller-defined state
    pub fn with_extra(
        name: impl Into<String>,
        fetcher: impl Fetcher<T> + 'static,
        initial_extra: X,
    ) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                fetcher: Arc::new(fetcher),
                shared: Mutex::new(Shared {
                    state: StoreState::initial(initial_extra.clone()),
                    in_flight: false,
                    generation: 0,
                    identity: None,
                }),
                initial_extra,
                version,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current data without side effects
    pub fn peek(&self) -> Option<T> {
        self.inner.lock().state.data.clone()
    }

    /// Current data; starts a background fetch if nothing was loaded yet
    ///
    /// Returns `None` until the first fetch completes. Use `subscribe` to be
    /// told when it does. Needs a running tokio runtime to start the fetch.
    pub fn get_data(&self) -> Option<T> {
        let (needs_fetch, data) = {
            let shared = self.inner.lock();
            (
                !shared.state.is_fetched && !shared.in_flight,
                shared.state.data.clone(),
            )
        };

        if needs_fetch {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let store = self.clone();
                    handle.spawn(async move {
                        store.refresh_data(true).await;
                    });
                }
                Err(_) => {
                    warn!(store = %self.inner.name, "No async runtime, cannot start fetch");
                }
            }
        }

        data
    }

    /// Fetch unless data is already loaded
    ///
    /// If another fetch is already running (for example one started by
    /// `get_data`), waits for it and reports how it ended instead of
    /// returning `Skipped`.
    pub async fn ensure_loaded(&self) -> RefreshOutcome {
        loop {
            if self.inner.lock().state.is_fetched {
                return RefreshOutcome::Cached;
            }

            match self.refresh_data(true).await {
                RefreshOutcome::Skipped => {}
                outcome => return outcome,
            }

            self.wait_until_idle().await;
            let (is_fetched, has_error) = {
                let shared = self.inner.lock();
                (shared.state.is_fetched, shared.state.error.is_some())
            };
            if is_fetched {
                return RefreshOutcome::Fetched;
            }
            if has_error {
                return RefreshOutcome::Failed;
            }
            // The other fetch was cancelled or reset; try again
        }
    }

    async fn wait_until_idle(&self) {
        let mut changes = self.subscribe();
        loop {
            let in_flight = self.inner.lock().in_flight;
            if !in_flight || changes.changed().await.is_err() {
                return;
            }
        }
    }

    /// Run the fetcher and store its result
    ///
    /// With `update_loading_flag`, `is_loading` is raised while fetching.
    /// Returns `Skipped` without calling the fetcher when another fetch is
    /// already running.
    pub async fn refresh_data(&self, update_loading_flag: bool) -> RefreshOutcome {
        let (generation, identity) = {
            let mut shared = self.inner.lock();
            if shared.in_flight {
                debug!(store = %self.inner.name, "Fetch already in flight, skipping refresh");
                return RefreshOutcome::Skipped;
            }
            shared.in_flight = true;
            if update_loading_flag {
                shared.state.is_loading = true;
            }
            (shared.generation, shared.identity.clone())
        };
        self.inner.notify();

        let mut guard = InFlightGuard {
            inner: &self.inner,
            generation,
            armed: true,
        };

        debug!(
            store = %self.inner.name,
            fetcher = self.inner.fetcher.name(),
            "Fetching"
        );
        let result = self.inner.fetcher.fetch().await;
        guard.armed = false;

        let mut shared = self.inner.lock();
        if shared.generation != generation {
            drop(shared);
            debug!(store = %self.inner.name, "Store was reset during fetch, discarding response");
            return RefreshOutcome::Discarded;
        }

        shared.in_flight = false;
        shared.state.is_loading = false;
        let outcome = match result {
            Ok(data) => {
                shared.state.data = Some(data);
                shared.state.is_fetched = true;
                shared.state.fetched_at = Some(Utc::now());
                shared.state.fetched_by = identity;
                shared.state.error = None;
                RefreshOutcome::Fetched
            }
            Err(e) => {
                warn!(store = %self.inner.name, error = %e, "Fetch failed");
                shared.state.error = Some(Arc::new(e));
                RefreshOutcome::Failed
            }
        };
        drop(shared);
        self.inner.notify();

        outcome
    }

    /// Return to the initial state
    ///
    /// A fetch that is still running will have its response discarded.
    pub fn reset_store(&self) {
        let mut shared = self.inner.lock();
        shared.generation = shared.generation.wrapping_add(1);
        shared.in_flight = false;
        shared.state = StoreState::initial(self.inner.initial_extra.clone());
        drop(shared);
        debug!(store = %self.inner.name, "Store reset");
        self.inner.notify();
    }

    pub fn has_error(&self) -> bool {
        self.inner.lock().state.error.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().state.is_loading
    }

    /// Snapshot of the full state
    pub fn state(&self) -> StoreState<T, X> {
        self.inner.lock().state.clone()
    }

    /// Modify the extra state
    pub fn update_extra(&self, f: impl FnOnce(&mut X)) {
        f(&mut self.inner.lock().state.extra);
        self.inner.notify();
    }

    /// Set the identity recorded as `fetched_by`
    ///
    /// Switching to a different identity (including signing out) resets the
    /// store so one user's data is never shown to another.
    pub fn set_identity(&self, identity: Option<String>) {
        let changed = {
            let mut shared = self.inner.lock();
            let changed = shared.identity != identity;
            shared.identity = identity;
            changed
        };
        if changed {
            self.reset_store();
        }
    }

    pub fn identity(&self) -> Option<String> {
        self.inner.lock().identity.clone()
    }

    /// Version counter bumped on every state change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }
}
