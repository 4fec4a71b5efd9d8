use std::collections::BTreeMap;

use tracing::warn;

use crate::{
    Adapter, AdapterDescriptor, Connection, ConnectionConfig, Error, Result, UnavailableAdapter,
};

/// Maps `db_type` discriminators to adapters. Built once at startup.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<&'static str, Box<dyn Adapter>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its descriptor's `db_type`, replacing any
    /// adapter previously registered for it.
    pub fn register(&mut self, adapter: Box<dyn Adapter>) -> &mut Self {
        self.adapters.insert(adapter.db_type(), adapter);
        self
    }

    /// Registers a placeholder that keeps the descriptor queryable but fails
    /// `connect` with `DriverMissing`.
    pub fn register_unavailable(&mut self, descriptor: &'static AdapterDescriptor) -> &mut Self {
        self.register(Box::new(UnavailableAdapter::new(descriptor)))
    }

    pub fn get(&self, db_type: &str) -> Result<&dyn Adapter> {
        self.adapters
            .get(db_type)
            .map(AsRef::as_ref)
            .ok_or_else(|| Error::UnknownBackend {
                db_type: db_type.to_string(),
                known: self.db_types().collect(),
            })
    }

    pub fn db_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.adapters.keys().copied()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static AdapterDescriptor> + '_ {
        self.adapters.values().map(|adapter| adapter.descriptor())
    }

    /// Resolves the adapter for `config.db_type` and opens a session with it.
    /// Option keys the adapter does not recognize are logged and ignored.
    pub fn connect(&self, config: &ConnectionConfig) -> Result<(&dyn Adapter, Connection)> {
        let adapter = self.get(&config.db_type)?;
        for key in config.unrecognized_options(adapter.descriptor()) {
            warn!(
                adapter = adapter.db_type(),
                connection = %config.name,
                option = key,
                "ignoring unrecognized option"
            );
        }
        let connection = adapter.connect(config)?;
        Ok((adapter, connection))
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.adapters.keys()).finish()
    }
}
