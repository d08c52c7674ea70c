use serde::{Deserialize, Serialize};

/// Scale/quality trade-off for rasterized page previews.
///
/// `scale` multiplies the page's point size into pixels; `quality` is the
/// lossy encoder quality in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub scale: f32,
    pub quality: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { scale: 1.5, quality: 80 }
    }
}
