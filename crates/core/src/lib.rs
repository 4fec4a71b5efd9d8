//! Adapter contract shared by every sqlit backend.
//!
//! A caller picks an [`Adapter`] by `db_type` (usually through an
//! [`AdapterRegistry`]), opens a [`Connection`] from a [`ConnectionConfig`],
//! and then runs metadata and query operations against that handle.

mod adapter;
pub mod catalog;
mod config;
mod connection;
pub mod descriptor;
mod error;
pub mod quote;
mod registry;
mod rows;
mod value;

pub use adapter::{Adapter, UnavailableAdapter};
pub use catalog::{ColumnInfo, IndexInfo, RawColumn, SequenceInfo, TableInfo, TriggerInfo};
pub use config::{ConnectionConfig, OptionValue};
pub use connection::Connection;
pub use descriptor::{AdapterDescriptor, Capabilities, DriverInfo, OptionSpec, PreviewSyntax};
pub use error::{BoxError, ConfigError, DriverMissing, Error, Result};
pub use quote::QuoteStyle;
pub use registry::AdapterRegistry;
pub use rows::{
    QueryResult, ROW_COUNT_UNKNOWN, Row, RowCollector, apply_row_limit, collect_rows,
    reports_row_count,
};
pub use value::Value;
