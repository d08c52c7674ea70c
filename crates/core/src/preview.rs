//! Rendering of a single original page for display.

use crate::error::{EngineError, PlanField, Result, ValidationError};
use folio_traits::DocumentCodec;
use folio_types::RenderOptions;

/// Rasterizes 1-based `page` of `document`. Never touches session output.
pub fn render_preview<C: DocumentCodec>(
    codec: &C,
    document: &C::Document,
    page: u32,
    options: RenderOptions,
) -> Result<Vec<u8>> {
    let page_count = codec.page_count(document) as u32;
    if page == 0 || page > page_count {
        return Err(EngineError::Validation(ValidationError::PageOutOfRange {
            number: page,
            page_count,
            field: PlanField::Preview,
        }));
    }

    let image = codec.render(document, page as usize - 1, options)?;
    log::debug!("Rendered preview of page {} ({} bytes)", page, image.len());
    Ok(image)
}
