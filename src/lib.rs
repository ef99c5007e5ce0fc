//! Edge request router for a static content site.
//!
//! Classifies each request by path and either proxies it to a third-party API,
//! relays it to the analytics collector, redirects it, or serves it from the
//! asset store with a cache tier chosen by the path.

pub mod analytics;
pub mod assets;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;

pub use config::EdgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
