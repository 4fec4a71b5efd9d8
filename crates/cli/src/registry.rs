use sqlit_core::{AdapterRegistry, descriptor::builtin};

/// Every builtin backend, with the ones compiled into this binary backed by
/// their real adapter and the rest by a `DriverMissing` stand-in.
pub(crate) fn build_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    for descriptor in builtin::ALL {
        registry.register_unavailable(descriptor);
    }

    #[cfg(feature = "sqlite")]
    registry.register(Box::new(sqlit_adapter_sqlite::SqliteAdapter));
    #[cfg(feature = "postgresql")]
    registry.register(Box::new(sqlit_adapter_postgres::PostgresAdapter));
    #[cfg(feature = "mysql")]
    registry.register(Box::new(sqlit_adapter_mysql::MysqlAdapter));
    #[cfg(feature = "mssql")]
    registry.register(Box::new(sqlit_adapter_mssql::MssqlAdapter));
    #[cfg(feature = "snowflake")]
    registry.register(Box::new(sqlit_adapter_snowflake::SnowflakeAdapter));
    #[cfg(feature = "athena")]
    registry.register(Box::new(sqlit_adapter_athena::AthenaAdapter));

    registry
}

pub(crate) fn is_compiled(db_type: &str) -> bool {
    match db_type {
        "sqlite" => cfg!(feature = "sqlite"),
        "postgresql" => cfg!(feature = "postgresql"),
        "mysql" => cfg!(feature = "mysql"),
        "mssql" => cfg!(feature = "mssql"),
        "snowflake" => cfg!(feature = "snowflake"),
        "athena" => cfg!(feature = "athena"),
        _ => false,
    }
}
