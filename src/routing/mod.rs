//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered rule scan)
//!     → matcher.rs (prefix / suffix / extension checks)
//!     → RouteKind (proxy, analytics, redirect, or an asset tier)
//!
//! Rule Compilation (at startup):
//!     EdgeConfig
//!     → proxy prefixes, analytics prefix, legacy prefix, index suffix,
//!       stylesheet dir, font extensions, image extensions
//!     → Freeze as immutable Router
//! ```

pub mod matcher;
pub mod router;

pub use router::{RouteKind, Router};
