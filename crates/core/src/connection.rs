use std::{any::Any, fmt};

use crate::{Error, Result};

/// A live backend session.
///
/// The handle is owned by the caller from `connect` until it is closed or
/// dropped; dropping it releases the native session. Adapters borrow it
/// mutably for the duration of one operation, so a handle never serves two
/// operations at once.
pub struct Connection {
    db_type: &'static str,
    name: String,
    session: Box<dyn Any + Send>,
}

impl Connection {
    pub fn new<S>(db_type: &'static str, name: impl Into<String>, session: S) -> Self
    where
        S: Any + Send,
    {
        Self {
            db_type,
            name: name.into(),
            session: Box::new(session),
        }
    }

    #[must_use]
    pub fn db_type(&self) -> &'static str {
        self.db_type
    }

    /// Name of the `ConnectionConfig` this session was opened from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrows the backend-native session opened by the `expected` adapter.
    pub fn session_mut<S>(&mut self, expected: &'static str) -> Result<&mut S>
    where
        S: Any,
    {
        let actual = self.db_type;
        if actual != expected {
            return Err(Error::ConnectionMismatch { expected, actual });
        }

        self.session
            .downcast_mut::<S>()
            .ok_or(Error::ConnectionMismatch { expected, actual })
    }

    /// Takes the backend-native session out of the handle, typically to
    /// close it explicitly.
    pub fn into_session<S>(self, expected: &'static str) -> Result<S>
    where
        S: Any,
    {
        let actual = self.db_type;
        if actual != expected {
            return Err(Error::ConnectionMismatch { expected, actual });
        }

        self.session
            .downcast::<S>()
            .map(|session| *session)
            .map_err(|_| Error::ConnectionMismatch { expected, actual })
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("db_type", &self.db_type)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
