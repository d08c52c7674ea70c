//! SessionStorage trait for abstracting where session artifacts live.
//!
//! Each session owns one durable area holding its original upload and, once
//! committed, its composed output. The engine never sees paths; it only
//! stores and loads artifacts by session id.

use folio_types::SessionId;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Error type for session storage operations.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("No {artifact} stored for session {session}")]
    NotFound { session: SessionId, artifact: Artifact },

    #[error("Failed to write {artifact} for session {session}: {message}")]
    WriteFailed { session: SessionId, artifact: Artifact, message: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Session storage lock poisoned")]
    LockPoisoned,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

/// Shared artifact bytes (reference-counted).
pub type SharedBytes = Arc<Vec<u8>>;

/// The artifacts a session can hold.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Artifact {
    /// The uploaded document being edited.
    Original,
    /// The most recently committed composition.
    Output,
}

impl Artifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Original => "original.pdf",
            Artifact::Output => "output.pdf",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Original => f.write_str("original"),
            Artifact::Output => f.write_str("output"),
        }
    }
}

/// A trait for persisting per-session artifacts.
///
/// # Implementations
///
/// - `InMemorySessionStorage`: process memory (always available)
/// - `FilesystemSessionStorage` (crate `folio-storage`): one directory per session
pub trait SessionStorage: Send + Sync + Debug {
    /// Store `bytes` as `artifact`, replacing any previous value.
    ///
    /// The replacement is atomic: on error the previous value (if any) is
    /// still the one returned by [`load`](Self::load).
    fn store(&self, session: SessionId, artifact: Artifact, bytes: &[u8])
    -> Result<(), StorageError>;

    /// Load a stored artifact.
    fn load(&self, session: SessionId, artifact: Artifact) -> Result<SharedBytes, StorageError>;

    /// Check if an artifact is stored.
    fn exists(&self, session: SessionId, artifact: Artifact) -> bool;

    /// Release everything stored for `session`. Removing an unknown session
    /// is not an error.
    fn remove(&self, session: SessionId) -> Result<(), StorageError>;

    /// Returns a human-readable name for this backend (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// An in-memory session storage backend.
///
/// Artifacts live only as long as the process. Suitable for tests and for
/// single-process deployments where sessions are short-lived.
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    artifacts: RwLock<HashMap<(SessionId, Artifact), SharedBytes>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts across all sessions.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.artifacts.read().map(|a| a.len()).unwrap_or(0)
    }

    /// Returns `true` if the lock is poisoned (safe default).
    pub fn is_empty(&self) -> bool {
        self.artifacts.read().map(|a| a.is_empty()).unwrap_or(true)
    }
}

impl SessionStorage for InMemorySessionStorage {
    fn store(
        &self,
        session: SessionId,
        artifact: Artifact,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        let data = Arc::new(bytes.to_vec());
        let mut artifacts = self.artifacts.write().map_err(|_| StorageError::LockPoisoned)?;
        artifacts.insert((session, artifact), data);
        Ok(())
    }

    fn load(&self, session: SessionId, artifact: Artifact) -> Result<SharedBytes, StorageError> {
        let artifacts = self.artifacts.read().map_err(|_| StorageError::LockPoisoned)?;
        artifacts
            .get(&(session, artifact))
            .cloned()
            .ok_or(StorageError::NotFound { session, artifact })
    }

    fn exists(&self, session: SessionId, artifact: Artifact) -> bool {
        self.artifacts
            .read()
            .map(|a| a.contains_key(&(session, artifact)))
            .unwrap_or(false)
    }

    fn remove(&self, session: SessionId) -> Result<(), StorageError> {
        let mut artifacts = self.artifacts.write().map_err(|_| StorageError::LockPoisoned)?;
        artifacts.retain(|(id, _), _| *id != session);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "InMemorySessionStorage"
    }
}
