use crate::proof::{self, PageGeometry};
use folio_composer::PageAssembler;
use folio_traits::{CodecError, DocumentCodec, PageHandle};
use folio_types::RenderOptions;
use lopdf::{Document, ObjectId};

/// Lowest PDF version written for composed output.
const OUTPUT_VERSION: &str = "1.7";

/// Largest preview edge, in pixels, regardless of the requested scale.
const DEFAULT_MAX_PREVIEW_EDGE: u32 = 4096;

/// A decoded PDF with its page order resolved once at decode time.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    inner: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfDocument {
    pub fn from_lopdf(inner: Document) -> Self {
        let page_ids = inner.get_pages().into_values().collect();
        Self { inner, page_ids }
    }

    pub fn inner(&self) -> &Document {
        &self.inner
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Object id of the page at 0-based `index`.
    pub fn page_id(&self, index: usize) -> Option<ObjectId> {
        self.page_ids.get(index).copied()
    }

    /// Size and rotation of the page at 0-based `index`.
    pub fn geometry(&self, index: usize) -> Option<PageGeometry> {
        self.page_id(index)
            .map(|page_id| PageGeometry::from_page(&self.inner, page_id))
    }
}

/// `DocumentCodec` over lopdf.
///
/// Pages are copied as PDF objects (content streams, fonts and images are
/// carried over untouched), never re-rendered. Previews are page-geometry
/// proofs: a JPEG with the page's displayed aspect ratio and size, which is
/// what a thumbnail strip needs for layout. Pixel-accurate rasterization is
/// the job of a rasterizing codec.
#[derive(Debug, Clone, Copy)]
pub struct LopdfCodec {
    max_preview_edge: u32,
}

impl LopdfCodec {
    pub fn new() -> Self {
        Self { max_preview_edge: DEFAULT_MAX_PREVIEW_EDGE }
    }

    pub fn with_max_preview_edge(mut self, pixels: u32) -> Self {
        self.max_preview_edge = pixels.max(1);
        self
    }
}

impl Default for LopdfCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCodec for LopdfCodec {
    type Document = PdfDocument;

    fn decode(&self, bytes: &[u8]) -> Result<PdfDocument, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::Decode("input is empty".to_string()));
        }
        let inner = Document::load_mem(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
        let document = PdfDocument::from_lopdf(inner);
        log::debug!(
            "Decoded PDF {} with {} pages ({} bytes)",
            document.inner.version,
            document.page_count(),
            bytes.len()
        );
        Ok(document)
    }

    fn page_count(&self, document: &PdfDocument) -> usize {
        document.page_count()
    }

    fn encode(&self, pages: &[PageHandle<'_, PdfDocument>]) -> Result<Vec<u8>, CodecError> {
        let version = pages
            .iter()
            .map(|handle| handle.document.inner.version.as_str())
            .chain(std::iter::once(OUTPUT_VERSION))
            .max()
            .unwrap_or(OUTPUT_VERSION);

        let mut assembler = PageAssembler::new(version);
        // Distinct source documents, by identity; the position is the
        // assembler's source key so shared resources are copied once.
        let mut sources: Vec<&PdfDocument> = Vec::new();

        for handle in pages {
            let source_key = match sources.iter().position(|s| std::ptr::eq(*s, handle.document)) {
                Some(key) => key,
                None => {
                    sources.push(handle.document);
                    sources.len() - 1
                }
            };
            let page_id = handle.document.page_id(handle.index).ok_or(CodecError::PageIndex {
                index: handle.index,
                page_count: handle.document.page_count(),
            })?;
            assembler
                .append_page(source_key, &handle.document.inner, page_id)
                .map_err(|e| CodecError::Encode(e.to_string()))?;
        }

        let mut document = assembler.finish();
        let mut bytes = Vec::new();
        document
            .save_to(&mut bytes)
            .map_err(|e| CodecError::Encode(e.to_string()))?;

        log::debug!(
            "Encoded {} pages from {} source documents ({} bytes)",
            pages.len(),
            sources.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn render(
        &self,
        document: &PdfDocument,
        index: usize,
        options: RenderOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let geometry = document.geometry(index).ok_or(CodecError::PageIndex {
            index,
            page_count: document.page_count(),
        })?;
        proof::render_proof(geometry, options, self.max_preview_edge)
            .map_err(|message| CodecError::Render { index, message })
    }

    fn name(&self) -> &'static str {
        "LopdfCodec"
    }
}
