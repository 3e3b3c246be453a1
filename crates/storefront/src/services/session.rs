//! Session-scoped key/value storage.
//!
//! The cart service never touches the HTTP session directly; it receives a
//! [`SessionStore`] per request. In production that is the
//! [`tower_sessions::Session`] extracted by axum.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tower_sessions::Session;

/// Errors from session storage.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session backend failed.
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),

    /// A stored value could not be (de)serialized.
    #[error("session value error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The session backend is not reachable.
    #[error("session store unavailable")]
    Unavailable,
}

/// Get, put and forget named values for the current client session.
pub trait SessionStore: Send + Sync {
    fn get<T>(&self, key: &str) -> impl Future<Output = Result<Option<T>, SessionError>> + Send
    where
        T: DeserializeOwned + Send;

    fn put<T>(
        &self,
        key: &str,
        value: &T,
    ) -> impl Future<Output = Result<(), SessionError>> + Send
    where
        T: Serialize + Sync;

    fn forget(&self, key: &str) -> impl Future<Output = Result<(), SessionError>> + Send;
}

impl SessionStore for Session {
    async fn get<T>(&self, key: &str) -> Result<Option<T>, SessionError>
    where
        T: DeserializeOwned + Send,
    {
        Ok(Self::get::<T>(self, key).await?)
    }

    async fn put<T>(&self, key: &str, value: &T) -> Result<(), SessionError>
    where
        T: Serialize + Sync,
    {
        Ok(self.insert(key, value).await?)
    }

    async fn forget(&self, key: &str) -> Result<(), SessionError> {
        self.remove_value(key).await?;
        Ok(())
    }
}

/// In-memory session used by tests.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: Mutex<HashMap<String, serde_json::Value>>,
    fail_writes: AtomicBool,
}

impl MemorySession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put`/`forget` fail with
    /// [`SessionError::Unavailable`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Whether `key` currently holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    fn check_writable(&self) -> Result<(), SessionError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SessionError::Unavailable);
        }
        Ok(())
    }
}

impl SessionStore for MemorySession {
    async fn get<T>(&self, key: &str) -> Result<Option<T>, SessionError>
    where
        T: DeserializeOwned + Send,
    {
        let value = self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        value
            .map(serde_json::from_value)
            .transpose()
            .map_err(SessionError::from)
    }

    async fn put<T>(&self, key: &str, value: &T) -> Result<(), SessionError>
    where
        T: Serialize + Sync,
    {
        self.check_writable()?;
        let value = serde_json::to_value(value)?;
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<(), SessionError> {
        self.check_writable()?;
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_session_round_trips_values() {
        let session = MemorySession::new();
        session.put("count", &3_u32).await.unwrap();
        assert_eq!(session.get::<u32>("count").await.unwrap(), Some(3));

        session.forget("count").await.unwrap();
        assert_eq!(session.get::<u32>("count").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_session_write_failure_keeps_value() {
        let session = MemorySession::new();
        session.put("count", &1_u32).await.unwrap();

        session.fail_writes(true);
        assert!(matches!(
            session.put("count", &2_u32).await,
            Err(SessionError::Unavailable)
        ));
        assert!(session.forget("count").await.is_err());
        assert_eq!(session.get::<u32>("count").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_memory_session_type_mismatch_is_serde_error() {
        let session = MemorySession::new();
        session.put("count", &"three").await.unwrap();
        assert!(matches!(
            session.get::<u32>("count").await,
            Err(SessionError::Serde(_))
        ));
    }
}
