//! Loader capability
//!
//! The source of truth a namespace falls back to on a miss.

use std::fmt;

use async_trait::async_trait;

/// Loads the value for a key from the source of truth.
///
/// Called only after both the local cache and the owning peer missed.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

/// Adapts a plain closure into a [`Loader`].
///
/// ```
/// use distcache::namespace::{Loader, LoaderFn};
///
/// let loader = LoaderFn(|key: &str| -> anyhow::Result<Vec<u8>> { Ok(key.as_bytes().to_vec()) });
/// # let _ = loader;
/// ```
pub struct LoaderFn<F>(pub F);

#[async_trait]
impl<F> Loader for LoaderFn<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self.0)(key)
    }
}

impl<F> fmt::Debug for LoaderFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoaderFn")
    }
}
