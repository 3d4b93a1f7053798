//! Session memory
//!
//! Short-term: a bounded in-process conversation buffer. Long-term: a SQLite
//! profile store holding user identity, weighted preferences, and the full
//! transcript. Compression collapses older buffer turns into a summary once
//! the estimated token count crosses the configured threshold.

pub mod compression;
pub mod long_term;
pub mod short_term;

pub use compression::compress_if_needed;
pub use long_term::ProfileStore;
pub use short_term::ConversationBuffer;
