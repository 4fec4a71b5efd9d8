//! MySQL backend for sqlit over the synchronous `mysql` client.
//!
//! MySQL has no schema level below the database, so `database` and `schema`
//! arguments both name a database and the current one is used when neither
//! is given.

mod adapter;
mod catalog_queries;
mod value;

pub use adapter::MysqlAdapter;
