//! SQL Server backend for sqlit.
//!
//! `tiberius` is async-only; each connection owns a current-thread tokio
//! runtime and blocks on it, so the adapter keeps the blocking contract.

mod adapter;
mod catalog_queries;
mod value;

pub use adapter::MssqlAdapter;
