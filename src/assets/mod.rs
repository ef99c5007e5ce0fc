//! Static asset subsystem.
//!
//! # Data Flow
//! ```text
//! request path
//!     → store.rs (path → asset key → bytes + content type)
//!     → cache.rs (policy selected by the routing rule → response headers)
//! ```

pub mod cache;
pub mod store;

pub use cache::CachePolicy;
pub use store::{Asset, AssetError, AssetStore, FsAssetStore, MemoryAssetStore};
