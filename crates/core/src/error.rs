//! Defines the error taxonomy for all engine operations.

use folio_traits::{CodecError, StorageError};
use folio_types::{InsertionKey, SessionId};
use std::fmt;
use thiserror::Error;

/// Which part of a request a rejected page number came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanField {
    Removed,
    Order { position: usize },
    Preview,
}

impl fmt::Display for PlanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanField::Removed => f.write_str("removed pages"),
            PlanField::Order { position } => write!(f, "order item {}", position),
            PlanField::Preview => f.write_str("preview request"),
        }
    }
}

/// A request that can never succeed as written; the caller must change it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Page {number} in {field} is outside 1..={page_count}")]
    PageOutOfRange { number: u32, page_count: u32, field: PlanField },

    #[error("Fragment anchor {key} is outside 0..={page_count}")]
    AnchorOutOfRange { key: InsertionKey, page_count: u32 },

    #[error("Order item {position} inserts fragment {key}, which was never supplied")]
    UnknownFragment { key: InsertionKey, position: usize },

    #[error("Fragment {key} was supplied but the explicit order never places it")]
    UnplacedFragment { key: InsertionKey },

    #[error("No documents to merge")]
    NothingToMerge,
}

/// Resource limits exceeded by a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("Upload '{label}' is {size} bytes; the limit is {limit}")]
    UploadTooLarge { label: String, size: usize, limit: usize },

    #[error("{pages} pages exceed the limit of {limit}")]
    TooManyPages { pages: usize, limit: usize },

    #[error("{count} documents exceed the limit of {limit}")]
    TooManyDocuments { count: usize, limit: usize },

    #[error("{count} fragments exceed the limit of {limit}")]
    TooManyFragments { count: usize, limit: usize },
}

/// The main error enum for all engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    #[error("Session {0} has no committed output")]
    OutputNotFound(SessionId),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Fragment '{label}' at {key} could not be decoded: {source}")]
    Fragment {
        key: InsertionKey,
        label: String,
        #[source]
        source: CodecError,
    },

    #[error("Merge input {index} could not be decoded: {source}")]
    MergeInput {
        index: usize,
        #[source]
        source: CodecError,
    },

    #[error("Capacity exceeded: {0}")]
    Capacity(#[from] CapacityError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification used by transport layers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Codec,
    Capacity,
    Storage,
    Config,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::SessionNotFound(_) | EngineError::OutputNotFound(_) => ErrorKind::NotFound,
            EngineError::Codec(_)
            | EngineError::Fragment { .. }
            | EngineError::MergeInput { .. } => ErrorKind::Codec,
            EngineError::Capacity(_) => ErrorKind::Capacity,
            EngineError::Storage(_) => ErrorKind::Storage,
            EngineError::Config(_) => ErrorKind::Config,
        }
    }

    /// `NotFound` is always recoverable by the caller (re-upload).
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
