pub mod fixtures;
pub mod pdf_assertions;

use folio::{
    EngineConfig, FilesystemSessionStorage, InMemorySessionStorage, LopdfCodec, PdfEditor,
    SessionStorage,
};
use lopdf::Document as LopdfDocument;
use std::path::Path;
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Wrapper around a composed PDF with helper methods
pub struct OutputPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl OutputPdf {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(bytes)?;
        Ok(Self { bytes: bytes.to_vec(), doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// The label drawn on each page, in page order
    pub fn labels(&self) -> Vec<String> {
        pdf_assertions::page_labels(&self.doc)
    }

    /// Save PDF to a file for manual debugging
    #[allow(dead_code)]
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

/// An editor on in-memory storage with default configuration
pub fn memory_editor() -> PdfEditor {
    editor_on(Arc::new(InMemorySessionStorage::new()), EngineConfig::default())
}

/// An editor storing sessions under `dir`
#[allow(dead_code)]
pub fn filesystem_editor(dir: &Path) -> PdfEditor {
    let storage = FilesystemSessionStorage::new(dir).expect("create session directory");
    editor_on(Arc::new(storage), EngineConfig::default())
}

pub fn editor_on(storage: Arc<dyn SessionStorage>, config: EngineConfig) -> PdfEditor {
    PdfEditor::new(LopdfCodec::new(), storage, config).expect("valid configuration")
}
