//! Marquee - Conversational Film Assistant
//!
//! Routes user queries through a pluggable LLM backend, invokes typed
//! read-only tools against a local SQLite catalog, and maintains both a
//! bounded conversation buffer and durable per-user preference memory.

pub mod agent;
pub mod catalog;
pub mod config;
pub mod error;
pub mod memory;
pub mod provider;
pub mod telemetry;
pub mod tools;
pub mod types;

pub use agent::Agent;
pub use catalog::CatalogStore;
pub use config::AgentConfig;
pub use error::{MarqueeError, Result};
pub use memory::ProfileStore;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
