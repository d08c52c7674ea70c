//! DocumentCodec trait for abstracting the paginated document format.
//!
//! The engine treats a document as an ordered list of opaque pages. Decoding
//! bytes, copying pages into a new document and rasterizing a page are all
//! delegated to a codec so the engine never touches the binary format.

use folio_types::RenderOptions;
use std::fmt::Debug;
use thiserror::Error;

/// Error type for codec operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Failed to decode document: {0}")]
    Decode(String),

    #[error("Failed to encode document: {0}")]
    Encode(String),

    #[error("Failed to render page {index}: {message}")]
    Render { index: usize, message: String },

    #[error("Page index {index} is out of range for a document with {page_count} pages")]
    PageIndex { index: usize, page_count: usize },
}

/// A reference to one page of a decoded document, ready to be copied into an
/// output document. `index` is 0-based.
#[derive(Debug)]
pub struct PageHandle<'a, D> {
    pub document: &'a D,
    pub index: usize,
}

impl<D> Clone for PageHandle<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for PageHandle<'_, D> {}

/// A trait for decoding, assembling and rasterizing paginated documents.
///
/// The trait has an associated document type, so it is used through generics
/// rather than as a trait object.
///
/// # Implementations
///
/// - `LopdfCodec` (crate `folio-codec-lopdf`): PDF through lopdf
pub trait DocumentCodec: Send + Sync + Debug {
    /// The decoded, immutable document handle.
    type Document: Send + Sync + 'static;

    /// Decode a byte stream into a document.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Document, CodecError>;

    /// Number of pages in a decoded document.
    fn page_count(&self, document: &Self::Document) -> usize;

    /// Obtain a copyable handle to the page at 0-based `index`.
    fn copy_page<'a>(
        &self,
        document: &'a Self::Document,
        index: usize,
    ) -> Result<PageHandle<'a, Self::Document>, CodecError> {
        let page_count = self.page_count(document);
        if index >= page_count {
            return Err(CodecError::PageIndex { index, page_count });
        }
        Ok(PageHandle { document, index })
    }

    /// Build a new document from `pages`, in order, and return its bytes.
    ///
    /// Either a complete document is returned or an error; implementations
    /// never hand back a partially written output.
    fn encode(&self, pages: &[PageHandle<'_, Self::Document>]) -> Result<Vec<u8>, CodecError>;

    /// Rasterize the page at 0-based `index` into encoded image bytes.
    fn render(
        &self,
        document: &Self::Document,
        index: usize,
        options: RenderOptions,
    ) -> Result<Vec<u8>, CodecError>;

    /// Returns a human-readable name for this codec (for logging/debugging).
    fn name(&self) -> &'static str;
}
