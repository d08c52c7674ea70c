//! # folio
//!
//! Session-based PDF page editing: upload a document, preview its pages,
//! commit a plan that removes, reorders and splices in pages from other
//! documents, then download the result. Whole documents can also be merged
//! without a session.
//!
//! This crate wires the engine in `folio-core` to the lopdf codec and the
//! storage backends, loads configuration, and ships the `folio` binary.
//!
//! ```ignore
//! let editor = folio::pdf_editor(folio::EngineConfig::default())?;
//! let id = editor.create_session(&original)?;
//! let plan = folio::CompositionPlan::builder()
//!     .remove(2)
//!     .insert_after(1, folio::FragmentBlob::new("cover.pdf", cover))
//!     .build();
//! editor.commit(id, plan)?;
//! let bytes = editor.take_output(id)?;
//! ```

// Re-export workspace crates
pub use folio_codec_lopdf as codec;
pub use folio_core as engine;
pub use folio_storage as storage;
pub use folio_traits as traits;
pub use folio_types as types;

pub mod config;
pub mod plan_file;

pub use folio_codec_lopdf::{LopdfCodec, PageGeometry, PdfDocument};
pub use folio_core::{
    CapacityError, CommitSummary, CompositionPlan, EditSession, Editor, EngineConfig, EngineError,
    ErrorKind, FragmentBlob, LimitsConfig, MergedDocument, PlanBuilder, PreviewConfig, Result,
    SessionStore, StorageBackend, StorageConfig, ValidationError,
};
pub use folio_storage::{FilesystemSessionStorage, InMemorySessionStorage};
pub use folio_traits::{Artifact, CodecError, DocumentCodec, SessionStorage, StorageError};
pub use folio_types::{InsertionKey, PageSource, PlanItem, RenderOptions, SessionId};

pub use crate::config::{ConfigLoadError, load_config};
pub use crate::plan_file::{PlanFile, PlanFileError};

use std::sync::Arc;

/// The editor over PDF documents.
pub type PdfEditor = Editor<LopdfCodec>;

/// Opens the session storage backend selected by `config`.
pub fn open_storage(config: &StorageConfig) -> Result<Arc<dyn SessionStorage>> {
    let storage: Arc<dyn SessionStorage> = match config.backend {
        StorageBackend::Memory => Arc::new(InMemorySessionStorage::new()),
        StorageBackend::Filesystem => Arc::new(FilesystemSessionStorage::new(&config.path)?),
    };
    log::debug!("Opened {} session storage", storage.name());
    Ok(storage)
}

/// Builds a PDF editor with the storage backend named in `config`.
pub fn pdf_editor(config: EngineConfig) -> Result<PdfEditor> {
    let storage = open_storage(&config.storage)?;
    Editor::new(LopdfCodec::new(), storage, config)
}
