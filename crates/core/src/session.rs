//! The session store: live edit sessions and their durable artifacts.
//!
//! The store keeps the decoded original of every live session in memory and
//! delegates bytes (original upload, committed output) to a
//! [`SessionStorage`] backend. Sessions are independent; the only shared
//! lock is the id map, held just long enough to look up or remove a slot.
//!
//! Within one session, output replacement and retirement are serialized on a
//! per-session mutex. A commit that loses the race against retirement is
//! reported as `SessionNotFound` and leaves nothing behind.

use crate::error::{EngineError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use folio_traits::{Artifact, SessionStorage, SharedBytes, StorageError};
use folio_types::SessionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Metadata about a session's committed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputInfo {
    pub page_count: usize,
    pub byte_len: usize,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SessionState {
    output: Option<OutputInfo>,
    retired: bool,
}

/// One live edit session. The original is immutable for the session's
/// lifetime; only the output changes.
#[derive(Debug)]
pub struct EditSession<D> {
    id: SessionId,
    original: Arc<D>,
    page_count: u32,
    created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
}

impl<D> EditSession<D> {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn original(&self) -> &D {
        &self.original
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The current output, if a commit has succeeded.
    pub fn output(&self) -> Result<Option<OutputInfo>> {
        Ok(self.lock()?.output)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| EngineError::Storage(StorageError::LockPoisoned))
    }
}

/// All live sessions, keyed by id.
#[derive(Debug)]
pub struct SessionStore<D> {
    sessions: RwLock<HashMap<SessionId, Arc<EditSession<D>>>>,
    storage: Arc<dyn SessionStorage>,
}

impl<D> SessionStore<D> {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), storage }
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Registers a new session for an already decoded original and persists
    /// the upload. The id is freshly generated and never reused.
    pub fn insert(
        &self,
        original_bytes: &[u8],
        document: D,
        page_count: u32,
        now: DateTime<Utc>,
    ) -> Result<SessionId> {
        let id = SessionId::generate();
        self.storage.store(id, Artifact::Original, original_bytes)?;

        let session = Arc::new(EditSession {
            id,
            original: Arc::new(document),
            page_count,
            created_at: now,
            state: Mutex::new(SessionState::default()),
        });

        match self.sessions.write() {
            Ok(mut sessions) => {
                sessions.insert(id, session);
            }
            Err(_) => {
                // Roll back the stored upload; the session was never visible.
                if let Err(e) = self.storage.remove(id) {
                    log::warn!("Failed to clean up session {}: {}", id, e);
                }
                return Err(StorageError::LockPoisoned.into());
            }
        }

        log::debug!("Created session {} ({} pages) on {}", id, page_count, self.storage.name());
        Ok(id)
    }

    pub fn get(&self, id: SessionId) -> Result<Arc<EditSession<D>>> {
        let sessions = self.sessions.read().map_err(|_| StorageError::LockPoisoned)?;
        sessions.get(&id).cloned().ok_or(EngineError::SessionNotFound(id))
    }

    /// Atomically replaces the session's output. On failure the previous
    /// output, if any, is left intact.
    pub fn set_output(
        &self,
        id: SessionId,
        bytes: &[u8],
        page_count: usize,
        now: DateTime<Utc>,
    ) -> Result<OutputInfo> {
        let session = self.get(id)?;
        let mut state = session.lock()?;
        if state.retired {
            return Err(EngineError::SessionNotFound(id));
        }

        self.storage.store(id, Artifact::Output, bytes)?;
        let info = OutputInfo { page_count, byte_len: bytes.len(), committed_at: now };
        state.output = Some(info);
        Ok(info)
    }

    /// Bytes of the most recent successful commit.
    pub fn fetch_output(&self, id: SessionId) -> Result<SharedBytes> {
        let session = self.get(id)?;
        let state = session.lock()?;
        if state.output.is_none() {
            return Err(EngineError::OutputNotFound(id));
        }
        self.storage.load(id, Artifact::Output).map_err(|e| match e {
            StorageError::NotFound { .. } => EngineError::OutputNotFound(id),
            other => other.into(),
        })
    }

    /// Returns the output and retires the session. The load and the
    /// retirement happen under the session's lock, so of two concurrent
    /// takes exactly one gets the bytes; the other sees `SessionNotFound`.
    pub fn take_output(&self, id: SessionId) -> Result<SharedBytes> {
        let session = self.get(id)?;
        let bytes = {
            let mut state = session.lock()?;
            if state.retired {
                return Err(EngineError::SessionNotFound(id));
            }
            if state.output.is_none() {
                return Err(EngineError::OutputNotFound(id));
            }
            let bytes = self.storage.load(id, Artifact::Output).map_err(|e| match e {
                StorageError::NotFound { .. } => EngineError::OutputNotFound(id),
                other => other.into(),
            })?;
            state.retired = true;
            bytes
        };

        self.retire(id);
        Ok(bytes)
    }

    /// Ends a session and releases its storage. Retiring an unknown or
    /// already retired session is a no-op that returns `false`.
    pub fn retire(&self, id: SessionId) -> bool {
        let removed = match self.sessions.write() {
            Ok(mut sessions) => sessions.remove(&id),
            Err(poisoned) => poisoned.into_inner().remove(&id),
        };

        if let Some(session) = &removed {
            match session.state.lock() {
                Ok(mut state) => state.retired = true,
                Err(poisoned) => poisoned.into_inner().retired = true,
            }
        }

        // Storage is released even for ids the map no longer knows, so a
        // backend left over from an earlier process is cleaned up too.
        if let Err(e) = self.storage.remove(id) {
            log::warn!("Failed to release storage for session {}: {}", id, e);
        }

        if removed.is_some() {
            log::debug!("Retired session {}", id);
        }
        removed.is_some()
    }

    /// Retires every session created more than `max_age` before `now`.
    pub fn purge_expired(&self, max_age: TimeDelta, now: DateTime<Utc>) -> usize {
        let expired: Vec<SessionId> = match self.sessions.read() {
            Ok(sessions) => sessions
                .values()
                .filter(|s| now.signed_duration_since(s.created_at) > max_age)
                .map(|s| s.id)
                .collect(),
            Err(_) => return 0,
        };

        let purged = expired.into_iter().filter(|id| self.retire(*id)).count();
        if purged > 0 {
            log::info!("Purged {} expired sessions", purged);
        }
        purged
    }

    /// Number of live sessions. Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
