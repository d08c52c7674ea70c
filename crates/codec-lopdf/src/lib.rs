//! PDF codec for the Folio engine using lopdf.
//!
//! [`LopdfCodec`] implements `DocumentCodec`: it decodes PDF bytes into a
//! [`PdfDocument`], copies pages between documents without re-rendering them
//! (via `folio-composer`), and produces preview images.

mod codec;
mod proof;

pub use codec::{LopdfCodec, PdfDocument};
pub use proof::PageGeometry;
