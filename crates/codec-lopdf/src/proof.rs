//! Page-geometry proofs: preview images sized and shaped like the page.

use folio_types::RenderOptions;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use lopdf::{Document, Object, ObjectId};

const MAX_TREE_DEPTH: usize = 64;
const PAPER: Rgb<u8> = Rgb([255, 255, 255]);
const EDGE: Rgb<u8> = Rgb([160, 160, 160]);

/// Displayed page size in PDF points, and its `/Rotate` value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub rotation: i64,
}

impl PageGeometry {
    /// US Letter, used when a page carries no usable `/MediaBox`.
    pub const LETTER: PageGeometry = PageGeometry { width: 612.0, height: 792.0, rotation: 0 };

    pub fn from_page(doc: &Document, page_id: ObjectId) -> Self {
        let media_box = inherited(doc, page_id, b"MediaBox").and_then(|o| rect(doc, o));
        let rotation = inherited(doc, page_id, b"Rotate")
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0)
            .rem_euclid(360);

        match media_box {
            Some((width, height)) if width > 0.0 && height > 0.0 => {
                PageGeometry { width, height, rotation }
            }
            _ => PageGeometry { rotation, ..Self::LETTER },
        }
    }

    /// Width and height as displayed, after applying the page rotation.
    pub fn display_size(&self) -> (f32, f32) {
        if self.rotation == 90 || self.rotation == 270 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// Looks up a page attribute, following `/Parent` links for inherited ones.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node_id = Some(page_id);
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(node_id?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(doc: &Document, obj: &Object) -> Option<f32> {
    match resolve(doc, obj)? {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Width and height of a `[llx lly urx ury]` rectangle.
fn rect(doc: &Document, obj: &Object) -> Option<(f32, f32)> {
    let values = resolve(doc, obj)?.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let coords: Vec<f32> = values.iter().map(|v| number(doc, v)).collect::<Option<_>>()?;
    Some(((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs()))
}

/// Renders a bordered blank sheet with the page's displayed proportions.
pub(crate) fn render_proof(
    geometry: PageGeometry,
    options: RenderOptions,
    max_edge: u32,
) -> Result<Vec<u8>, String> {
    if !options.scale.is_finite() || options.scale <= 0.0 {
        return Err(format!("invalid preview scale {}", options.scale));
    }

    let (width_pt, height_pt) = geometry.display_size();
    let mut scale = options.scale;
    let longest = width_pt.max(height_pt) * scale;
    if longest > max_edge as f32 {
        scale *= max_edge as f32 / longest;
    }
    let width = ((width_pt * scale).round() as u32).max(1);
    let height = ((height_pt * scale).round() as u32).max(1);

    let mut canvas = RgbImage::from_pixel(width, height, PAPER);
    for x in 0..width {
        canvas.put_pixel(x, 0, EDGE);
        canvas.put_pixel(x, height - 1, EDGE);
    }
    for y in 0..height {
        canvas.put_pixel(0, y, EDGE);
        canvas.put_pixel(width - 1, y, EDGE);
    }

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, options.quality.clamp(1, 100))
        .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| e.to_string())?;
    Ok(encoded)
}
