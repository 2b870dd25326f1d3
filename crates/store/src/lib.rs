//! SQLite storage for VitaCoach.
//!
//! Two backends share one database file:
//! - [`SqliteStore`] — daily metrics, the conversation log, and alerts
//! - [`SummaryIndex`] — FTS5-ranked semantic search over daily summaries
//!
//! Both implement traits from `vitacoach-core`, so the engine never sees
//! SQLite directly.

pub mod index;
pub mod sqlite;
pub mod summary;

pub use index::SummaryIndex;
pub use sqlite::SqliteStore;
pub use summary::create_daily_summary;
