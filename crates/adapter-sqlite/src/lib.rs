//! SQLite backend for sqlit, built on `rusqlite` with a bundled engine.
//!
//! `database` is the file path (or `:memory:`). Attached databases are
//! addressed through the `database` / `schema` arguments of the metadata
//! operations.

mod adapter;
mod catalog_queries;
mod value;

pub use adapter::SqliteAdapter;
