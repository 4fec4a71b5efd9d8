//! PostgreSQL backend for sqlit over the synchronous `postgres` client.

mod adapter;
mod catalog_queries;
mod value;

pub use adapter::PostgresAdapter;
