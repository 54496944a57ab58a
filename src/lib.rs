//! Strata - Incremental build-layer cache
//!
//! Identifies each build layer by a content-addressed key chained on its
//! predecessor, so a change to one layer invalidates it and everything
//! after it, and replays only the layers whose keys miss the cache.

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod hash;
pub mod journal;
pub mod layer;
pub mod planner;

pub use error::{StrataError, StrataResult};
