//! Snowflake backend for sqlit.
//!
//! Two login flows are supported:
//!
//! - username and password (the `snowflake` authenticator, and the default
//!   when a username is set) log in through the session endpoints; the
//!   session is stateful, so `USE` statements persist;
//! - a bearer token in the password field (`programmatic_access_token`,
//!   `oauth`, `keypair_jwt`) goes through the SQL API
//!   (`/api/v2/statements`), which is stateless: the session context
//!   (database, schema, warehouse, role) travels with every request.

mod adapter;
mod api;
mod catalog_queries;
mod client;
mod session;
mod value;

pub use adapter::SnowflakeAdapter;
pub use client::ApiError;
