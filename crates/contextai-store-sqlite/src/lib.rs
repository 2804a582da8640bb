//! SQLite backend for the ContextAI log scoring engine.
//!
//! Each project owns a log database and a ranking database; one global
//! ranking database is shared by all projects. All access is synchronous and
//! goes through plain [`rusqlite`] connections.

mod encode;

pub mod connection;
pub mod context;
pub mod engine;
pub mod error;
pub mod logs;
pub mod ranking;
pub mod reinforce;
pub mod schema;
pub mod store;

pub use engine::{AskOutcome, AskRequest, ContextEngine};
pub use error::{Error, Result};
pub use ranking::GlobalRankings;
pub use reinforce::ReinforceReport;
pub use store::{LogDb, RankingDb};
