//! Academic insight engine: per-student predictions and merge-only insight
//! profiles, plus an institution-wide aggregate report.

pub mod action_plan;
pub mod aggregate;
pub mod catalog;
pub mod cluster;
pub mod db;
pub mod error;
pub mod insight;
pub mod models;
pub mod ranking;
pub mod report;
pub mod risk;
pub mod skills;
pub mod store;
pub mod trend;

pub use error::{EngineError, Result};
