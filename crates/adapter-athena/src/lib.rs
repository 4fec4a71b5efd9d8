//! AWS Athena backend for sqlit.
//!
//! Athena has no schema level of its own: a Glue database plays the role of
//! both database and schema, so catalog listings report the database name
//! as the schema. Every statement is an asynchronous query execution that
//! is polled to completion and whose results are paged back.

mod adapter;
mod catalog_queries;
mod client;
mod value;

pub use adapter::AthenaAdapter;
pub use client::AthenaError;
