//! Analytics relay subsystem.
//!
//! # Data Flow
//! ```text
//! GET /_ga?ga=UA-…&dt=…&plt=…
//!     → admission.rs (referrer, user agent, tracking id, allow-list) → 403 on refusal
//!     → session.rs (reuse `uuid` cookie or mint a new id)
//!     → relay.rs (page-view + timing hits, sent from a background task)
//!     → 204 No Content (+ Set-Cookie for a new id), without waiting on the hits
//! ```

pub mod admission;
pub mod relay;
pub mod session;

pub use admission::{Admission, AdmissionFilter, Admitted, BlockReason};
pub use relay::{AnalyticsRelay, Hit, HitKind};
pub use session::{generate_session_id, Session};
