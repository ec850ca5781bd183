//! Core types and error handling for the cadence metrics pipeline.
//!
//! This crate provides the shared foundation used by the other cadence
//! crates:
//! - [`CadenceError`] — unified error type using `thiserror`
//! - Parsed records: [`Commit`], [`FileChange`], [`Contributor`], [`Tag`]
//! - Derived records: [`Deployment`], [`MetricValue`], [`MetricResult`]
//! - Query bounds and options: [`TimeWindow`], [`MetricOptions`],
//!   [`HistoryRecords`]

mod error;
mod result;
mod types;
mod value;

pub use error::CadenceError;
pub use result::{Metadata, MetricResult};
pub use types::{
    Commit, Contributor, Deployment, DeploymentKind, FileChange, HistoryRecords, MetricOptions,
    Tag, TimeWindow,
};
pub use value::{Attributes, MetricValue};

/// A convenience `Result` type for cadence operations.
pub type Result<T> = std::result::Result<T, CadenceError>;
