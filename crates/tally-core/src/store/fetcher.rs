//! Fetcher abstraction and the simple in-process fetchers

use std::future::Future;

use async_trait::async_trait;

use crate::error::Result;

/// Something that can load a collection snapshot
///
/// Fetchers must be Send + Sync so a store can run them from spawned tasks.
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    /// Load the current value
    async fn fetch(&self) -> Result<T>;

    /// Short name for logging
    fn name(&self) -> &str {
        "fetcher"
    }
}

/// Fetcher backed by an async closure
pub struct FnFetcher<F> {
    name: String,
    f: F,
}

impl<F> FnFetcher<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<T, F, Fut> Fetcher<T> for FnFetcher<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
{
    async fn fetch(&self) -> Result<T> {
        (self.f)().await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fetcher that always returns the same value
#[derive(Clone)]
pub struct StaticFetcher<T> {
    value: T,
}

impl<T> StaticFetcher<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

#[async_trait]
impl<T> Fetcher<T> for StaticFetcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch(&self) -> Result<T> {
        Ok(self.value.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Runs a check on every fetched value before the store accepts it
///
/// A failed check turns into a fetch error, so the store keeps its previous
/// data and records the error.
pub struct CheckedFetcher<F, C> {
    inner: F,
    check: C,
}

impl<F, C> CheckedFetcher<F, C> {
    pub fn new(inner: F, check: C) -> Self {
        Self { inner, check }
    }
}

#[async_trait]
impl<T, F, C> Fetcher<T> for CheckedFetcher<F, C>
where
    T: Send + 'static,
    F: Fetcher<T>,
    C: Fn(&T) -> Result<()> + Send + Sync,
{
    async fn fetch(&self) -> Result<T> {
        let value = self.inner.fetch().await?;
        (self.check)(&value)?;
        Ok(value)
    }

    fn name(&self) -> &str {
        Fetcher::<T>::name(&self.inner)
    }
}
