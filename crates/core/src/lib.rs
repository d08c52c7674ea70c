//! # folio-core
//!
//! The page composition engine: edit sessions over an uploaded document,
//! composition plans, and whole-document merge.
//!
//! - **plan**: `CompositionPlan`, its builder and boundary validation
//! - **resolve**: Phase 1, plan to ordered page references (pure)
//! - **compose**: Phase 2 materialization and merge, through a `DocumentCodec`
//! - **session**: the `SessionStore` of live sessions and their artifacts
//! - **preview**: single-page rendering of a session's original
//! - **editor**: `Editor`, the upward interface with capacity checks
//! - **config** / **error**: engine configuration and the error taxonomy
//!
//! ## Design Principle
//!
//! This crate never touches a binary document format or a filesystem path:
//! - Documents are decoded, copied and encoded by a `DocumentCodec`
//! - Session bytes live behind a `SessionStorage`
//! - The session store is an explicit value, never a process-wide singleton

// Re-export foundation crates
pub use folio_traits as traits;
pub use folio_types as types;

pub mod compose;
pub mod config;
pub mod editor;
pub mod error;
pub mod plan;
pub mod preview;
pub mod resolve;
pub mod session;

pub use compose::Composition;
pub use config::{EngineConfig, LimitsConfig, PreviewConfig, StorageBackend, StorageConfig};
pub use editor::{CommitSummary, Editor, MergedDocument};
pub use error::{CapacityError, EngineError, ErrorKind, PlanField, Result, ValidationError};
pub use plan::{CompositionPlan, FragmentBlob, PlanBuilder};
pub use session::{EditSession, OutputInfo, SessionStore};

pub use folio_traits::{
    Artifact, CodecError, DocumentCodec, InMemorySessionStorage, PageHandle, SessionStorage,
    SharedBytes, StorageError,
};
pub use folio_types::{InsertionKey, PageSource, PlanItem, RenderOptions, SessionId};
