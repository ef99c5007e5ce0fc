//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build server state → Bind listener
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → Stop accepting → Finish in-flight requests
//!
//! Background work (background.rs):
//!     Relay tasks registered per request → drained with a deadline after the server stops
//! ```

pub mod background;
pub mod shutdown;
pub mod signals;

pub use background::BackgroundTasks;
pub use shutdown::Shutdown;
