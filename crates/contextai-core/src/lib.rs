//! Core types for the ContextAI log scoring and retrieval engine.
//!
//! This crate is free of database and process dependencies. The SQLite
//! backend and the command-line front end both build on it.

pub mod config;
pub mod error;
pub mod exec;
pub mod log;
pub mod prompt;
pub mod ranking;
pub mod score;

pub use error::{Error, Result};
