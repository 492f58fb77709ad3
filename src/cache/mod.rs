//! Query cache for API reads.
//!
//! This module provides:
//! - Hierarchical query keys with prefix matching
//! - Per-key coalescing of concurrent reads onto one request
//! - Prefix invalidation so writes force the next read to refetch

mod key;
mod layer;
mod traits;

pub use key::{KeySegment, QueryKey};
pub use layer::QueryClient;
pub use traits::{CacheResult, CacheSource};
