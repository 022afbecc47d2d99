//! Namespace Module
//!
//! Named caches that coordinate the local cache, the owning peer and the
//! loader, plus the registry that looks them up by name.

mod group;
mod loader;
mod registry;

// Re-export public types
pub use group::{Namespace, NamespaceBuilder};
pub use loader::{Loader, LoaderFn};
pub use registry::Registry;
