//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Analytics relay request:
//!     → analytics::admission (referrer / user agent / tracking id / allow-list)
//!     → 403 on refusal
//!
//! Page response:
//!     → headers.rs (X-XSS-Protection, preload hint)
//! ```

pub mod headers;

pub use headers::PageHeaders;
