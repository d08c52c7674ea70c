//! The upward interface of the engine.
//!
//! [`Editor`] owns a codec, a session store and the engine configuration, and
//! exposes the operations a transport layer calls: create a session, preview
//! a page, commit a plan, fetch or take the output, retire the session, and
//! merge whole documents. Capacity limits are enforced here, around the core
//! algorithms, never inside them.

use crate::compose;
use crate::config::EngineConfig;
use crate::error::{CapacityError, EngineError, Result, ValidationError};
use crate::plan::CompositionPlan;
use crate::preview;
use crate::session::SessionStore;
use chrono::Utc;
use folio_traits::{DocumentCodec, SessionStorage, SharedBytes};
use folio_types::{RenderOptions, SessionId};
use std::sync::Arc;

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub page_count: usize,
    pub byte_len: usize,
}

/// A merged document and what went into it.
#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Inputs that were empty and therefore skipped.
    pub skipped: usize,
}

/// Session-based page editor over a document codec.
pub struct Editor<C: DocumentCodec> {
    codec: C,
    sessions: SessionStore<C::Document>,
    config: EngineConfig,
}

impl<C: DocumentCodec> std::fmt::Debug for Editor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("codec", &self.codec)
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<C: DocumentCodec> Editor<C> {
    pub fn new(codec: C, storage: Arc<dyn SessionStorage>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        log::debug!("Editor using {} on {} storage", codec.name(), storage.name());
        Ok(Self { codec, sessions: SessionStore::new(storage), config })
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn sessions(&self) -> &SessionStore<C::Document> {
        &self.sessions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decodes `bytes` and opens a new edit session on it.
    pub fn create_session(&self, bytes: &[u8]) -> Result<SessionId> {
        self.check_upload("original", bytes.len())?;

        let document = self.codec.decode(bytes)?;
        let page_count = self.codec.page_count(&document);
        self.check_pages(page_count)?;

        let id = self.sessions.insert(bytes, document, page_count as u32, Utc::now())?;
        log::info!("Opened session {} ({} pages)", id, page_count);
        Ok(id)
    }

    /// Page count of the session's original.
    pub fn page_count(&self, id: SessionId) -> Result<u32> {
        Ok(self.sessions.get(id)?.page_count())
    }

    /// Renders a page of the session's original with the configured options.
    pub fn preview(&self, id: SessionId, page: u32) -> Result<Vec<u8>> {
        self.preview_with(id, page, self.config.preview.render_options())
    }

    pub fn preview_with(&self, id: SessionId, page: u32, options: RenderOptions) -> Result<Vec<u8>> {
        let session = self.sessions.get(id)?;
        preview::render_preview(&self.codec, session.original(), page, options)
    }

    /// Composes the session's original according to `plan` and records the
    /// result as the session's output, replacing any earlier one.
    ///
    /// Nothing is recorded unless every step succeeds. The plan, and with it
    /// every fragment blob, is released before this returns.
    pub fn commit(&self, id: SessionId, plan: CompositionPlan) -> Result<CommitSummary> {
        let session = self.sessions.get(id)?;

        let fragment_count = plan.fragment_count();
        if fragment_count > self.config.limits.max_fragments {
            return Err(CapacityError::TooManyFragments {
                count: fragment_count,
                limit: self.config.limits.max_fragments,
            }
            .into());
        }
        for blob in plan.fragments().values().flatten() {
            self.check_upload(&blob.label, blob.bytes.len())?;
        }

        let composition = compose::compose(&self.codec, session.original(), &plan)?;
        drop(plan);
        self.check_pages(composition.page_count())?;

        if composition.page_count() == 0 {
            log::warn!("Session {} committed an empty document", id);
        }

        let info = self.sessions.set_output(
            id,
            &composition.bytes,
            composition.page_count(),
            Utc::now(),
        )?;
        log::info!(
            "Committed session {}: {} pages, {} bytes",
            id,
            info.page_count,
            info.byte_len
        );
        Ok(CommitSummary { page_count: info.page_count, byte_len: info.byte_len })
    }

    /// The most recently committed output. Non-destructive.
    pub fn fetch_output(&self, id: SessionId) -> Result<SharedBytes> {
        self.sessions.fetch_output(id)
    }

    /// Returns the output and retires the session. Exclusive: concurrent
    /// takes on one session hand the output to exactly one caller.
    pub fn take_output(&self, id: SessionId) -> Result<SharedBytes> {
        let bytes = self.sessions.take_output(id)?;
        log::info!("Retired session {} after download", id);
        Ok(bytes)
    }

    /// Ends a session. Unknown or already retired ids are ignored.
    pub fn retire_session(&self, id: SessionId) {
        if self.sessions.retire(id) {
            log::info!("Retired session {}", id);
        }
    }

    /// Retires sessions older than the configured TTL.
    pub fn purge_expired(&self) -> usize {
        self.sessions
            .purge_expired(self.config.storage.session_ttl(), Utc::now())
    }

    /// Concatenates whole documents in input order.
    ///
    /// Empty inputs (unused upload slots) are skipped with a warning;
    /// documents with zero pages are decoded and contribute nothing. Fails
    /// with `NothingToMerge` when no non-empty input remains.
    pub fn merge<B: AsRef<[u8]>>(&self, inputs: &[B]) -> Result<MergedDocument> {
        let usable = inputs.iter().filter(|input| !input.as_ref().is_empty()).count();
        if usable == 0 {
            return Err(ValidationError::NothingToMerge.into());
        }
        if usable > self.config.limits.max_documents {
            return Err(CapacityError::TooManyDocuments {
                count: usable,
                limit: self.config.limits.max_documents,
            }
            .into());
        }

        let mut documents = Vec::with_capacity(usable);
        let mut skipped = 0;

        for (index, input) in inputs.iter().enumerate() {
            let bytes = input.as_ref();
            if bytes.is_empty() {
                log::warn!("Skipping empty merge input {}", index + 1);
                skipped += 1;
                continue;
            }
            self.check_upload(&format!("input {}", index + 1), bytes.len())?;
            let document = self
                .codec
                .decode(bytes)
                .map_err(|source| EngineError::MergeInput { index: index + 1, source })?;
            self.check_pages(self.codec.page_count(&document))?;
            documents.push(document);
        }

        let composition = compose::merge(&self.codec, &documents)?;
        self.check_pages(composition.page_count())?;

        log::info!(
            "Merged {} documents into {} pages ({} empty inputs skipped)",
            documents.len(),
            composition.page_count(),
            skipped
        );
        let page_count = composition.page_count();
        Ok(MergedDocument { bytes: composition.bytes, page_count, skipped })
    }

    fn check_upload(&self, label: &str, size: usize) -> Result<()> {
        let limit = self.config.limits.max_upload_bytes;
        if size > limit {
            return Err(CapacityError::UploadTooLarge { label: label.to_string(), size, limit }.into());
        }
        Ok(())
    }

    fn check_pages(&self, pages: usize) -> Result<()> {
        let limit = self.config.limits.max_pages;
        if pages > limit {
            return Err(CapacityError::TooManyPages { pages, limit }.into());
        }
        Ok(())
    }
}
