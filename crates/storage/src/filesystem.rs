//! Filesystem-based session storage for native platforms.
//!
//! Layout: `<base>/<session-id>/original.pdf` and `<base>/<session-id>/output.pdf`.
//! Session directory names come from [`SessionId`]'s hex form, so a session id
//! can never address anything outside the base directory.
//!
//! Writes go to a temporary file inside the session directory which is then
//! renamed over the target, so readers observe either the old artifact or the
//! new one, never a partial write.

use folio_traits::{Artifact, SessionStorage, SharedBytes, StorageError};
use folio_types::SessionId;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// A session storage backend that keeps artifacts on the local filesystem.
#[derive(Debug)]
pub struct FilesystemSessionStorage {
    base_path: PathBuf,
}

impl FilesystemSessionStorage {
    /// Creates the backend, creating `base_path` if it does not exist yet.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Returns the base path for this backend.
    pub fn base(&self) -> &Path {
        &self.base_path
    }

    fn session_dir(&self, session: SessionId) -> PathBuf {
        self.base_path.join(session.as_simple())
    }

    fn artifact_path(&self, session: SessionId, artifact: Artifact) -> PathBuf {
        self.session_dir(session).join(artifact.file_name())
    }
}

impl SessionStorage for FilesystemSessionStorage {
    fn store(
        &self,
        session: SessionId,
        artifact: Artifact,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        let dir = self.session_dir(session);
        let write_failed = |e: std::io::Error| StorageError::WriteFailed {
            session,
            artifact,
            message: e.to_string(),
        };

        std::fs::create_dir_all(&dir).map_err(write_failed)?;

        let mut staged = NamedTempFile::new_in(&dir).map_err(write_failed)?;
        staged.write_all(bytes).map_err(write_failed)?;
        staged.as_file().sync_all().map_err(write_failed)?;
        staged
            .persist(self.artifact_path(session, artifact))
            .map_err(|e| write_failed(e.error))?;

        log::debug!(
            "Stored {} ({} bytes) for session {} under {}",
            artifact,
            bytes.len(),
            session,
            dir.display()
        );
        Ok(())
    }

    fn load(&self, session: SessionId, artifact: Artifact) -> Result<SharedBytes, StorageError> {
        std::fs::read(self.artifact_path(session, artifact))
            .map(Arc::new)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StorageError::NotFound { session, artifact }
                } else {
                    StorageError::Io(e.to_string())
                }
            })
    }

    fn exists(&self, session: SessionId, artifact: Artifact) -> bool {
        self.artifact_path(session, artifact).is_file()
    }

    fn remove(&self, session: SessionId) -> Result<(), StorageError> {
        match std::fs::remove_dir_all(self.session_dir(session)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "FilesystemSessionStorage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_filesystem_store_and_load() {
        let dir = tempdir().unwrap();
        let storage = FilesystemSessionStorage::new(dir.path()).unwrap();
        let id = SessionId::generate();

        storage.store(id, Artifact::Original, b"%PDF-1.7 original").unwrap();
        let data = storage.load(id, Artifact::Original).unwrap();
        assert_eq!(&*data, b"%PDF-1.7 original");

        let on_disk = dir.path().join(id.to_string()).join("original.pdf");
        assert_eq!(fs::read(on_disk).unwrap(), b"%PDF-1.7 original");
    }

    #[test]
    fn test_filesystem_creates_missing_base() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("nested").join("sessions");
        let storage = FilesystemSessionStorage::new(&base).unwrap();
        assert!(base.is_dir());
        assert_eq!(storage.base(), base.as_path());
    }

    #[test]
    fn test_filesystem_missing_output_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = FilesystemSessionStorage::new(dir.path()).unwrap();
        let id = SessionId::generate();
        storage.store(id, Artifact::Original, b"x").unwrap();

        assert!(matches!(
            storage.load(id, Artifact::Output),
            Err(StorageError::NotFound { artifact: Artifact::Output, .. })
        ));
        assert!(!storage.exists(id, Artifact::Output));
    }

    #[test]
    fn test_filesystem_output_is_replaced_without_leftovers() {
        let dir = tempdir().unwrap();
        let storage = FilesystemSessionStorage::new(dir.path()).unwrap();
        let id = SessionId::generate();

        storage.store(id, Artifact::Output, b"first output").unwrap();
        storage.store(id, Artifact::Output, b"second").unwrap();

        assert_eq!(&*storage.load(id, Artifact::Output).unwrap(), b"second");

        // Only the artifact itself remains; staged temp files were renamed away.
        let entries: Vec<_> = fs::read_dir(dir.path().join(id.to_string()))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("output.pdf")]);
    }

    #[test]
    fn test_filesystem_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = FilesystemSessionStorage::new(dir.path()).unwrap();
        let id = SessionId::generate();
        storage.store(id, Artifact::Original, b"x").unwrap();
        storage.store(id, Artifact::Output, b"y").unwrap();

        storage.remove(id).unwrap();
        assert!(!dir.path().join(id.to_string()).exists());

        storage.remove(id).unwrap();
        storage.remove(SessionId::generate()).unwrap();
    }

    #[test]
    fn test_filesystem_sessions_are_isolated() {
        let dir = tempdir().unwrap();
        let storage = FilesystemSessionStorage::new(dir.path()).unwrap();
        let a = SessionId::generate();
        let b = SessionId::generate();
        storage.store(a, Artifact::Original, b"a").unwrap();
        storage.store(b, Artifact::Original, b"b").unwrap();

        storage.remove(a).unwrap();
        assert!(!storage.exists(a, Artifact::Original));
        assert_eq!(&*storage.load(b, Artifact::Original).unwrap(), b"b");
    }

    #[test]
    fn test_backend_name() {
        let dir = tempdir().unwrap();
        let storage = FilesystemSessionStorage::new(dir.path()).unwrap();
        assert_eq!(storage.name(), "FilesystemSessionStorage");
    }
}
