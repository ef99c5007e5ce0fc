//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, allow-list compilation)
//!     → EdgeConfig (validated, immutable)
//!     → handed to HttpServer, which builds per-subsystem state from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AllowList, AnalyticsConfig, AssetsConfig, EdgeConfig, ListenerConfig, ObservabilityConfig,
    PathRewrite, ProxyConfig, SiteConfig, TimeoutConfig, UpstreamConfig,
};
