//! Office hours insights: role-gated aggregate statistics over queue
//! questions and course enrollments.
//!
//! An HTTP layer holds one [`InsightRegistry`] built at startup and calls
//! [`InsightRegistry::compute`] with a store, the caller's role and the
//! requested filters.

pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod insights;
pub mod models;
pub mod output;
pub mod preferences;
pub mod query;
pub mod registry;
pub mod report;
pub mod stats;
pub mod store;

pub use error::{InsightError, Result};
pub use filter::Filter;
pub use models::Role;
pub use output::{InsightComponent, InsightOutput};
pub use registry::{ComputedInsight, InsightDefinition, InsightRegistry};
pub use store::{InsightStore, PgStore};
