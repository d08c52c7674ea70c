//! Phase 2: materializing a resolved page sequence, and whole-document merge.
//!
//! Both operations end in a single `DocumentCodec::encode` call over a list
//! of page handles, so the codec either returns a complete document or an
//! error and nothing partial ever reaches the session store.

use crate::error::{EngineError, Result};
use crate::plan::{CompositionPlan, FragmentBlob};
use crate::resolve::{self, FragmentLayout};
use folio_traits::{CodecError, DocumentCodec, PageHandle};
use folio_types::{InsertionKey, PageSource};
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Decoded fragment documents, per group, in supplied order.
pub type DecodedFragments<D> = BTreeMap<InsertionKey, Vec<D>>;

/// The product of one composition: the encoded document and where each of
/// its pages came from.
#[derive(Debug, Clone)]
pub struct Composition {
    pub bytes: Vec<u8>,
    pub sources: Vec<PageSource>,
}

impl Composition {
    pub fn page_count(&self) -> usize {
        self.sources.len()
    }
}

/// Decodes every fragment blob of `plan`. The first failure aborts the whole
/// commit; a fragment is never skipped.
pub fn decode_fragments<C: DocumentCodec>(
    codec: &C,
    plan: &CompositionPlan,
) -> Result<DecodedFragments<C::Document>> {
    let jobs: Vec<(InsertionKey, &FragmentBlob)> = plan
        .fragments()
        .iter()
        .flat_map(|(key, blobs)| blobs.iter().map(move |blob| (*key, blob)))
        .collect();

    let decode = |(key, blob): &(InsertionKey, &FragmentBlob)| {
        codec
            .decode(&blob.bytes)
            .map(|doc| (*key, doc))
            .map_err(|source| EngineError::Fragment {
                key: *key,
                label: blob.label.clone(),
                source,
            })
    };

    #[cfg(feature = "parallel")]
    let decoded: Vec<(InsertionKey, C::Document)> =
        jobs.par_iter().map(decode).collect::<Result<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let decoded: Vec<(InsertionKey, C::Document)> =
        jobs.iter().map(decode).collect::<Result<_>>()?;

    // Collecting preserves job order, so blobs stay in supplied order per key.
    let mut fragments: DecodedFragments<C::Document> =
        plan.fragments().keys().map(|key| (*key, Vec::new())).collect();
    for (key, doc) in decoded {
        fragments.entry(key).or_default().push(doc);
    }
    Ok(fragments)
}

/// Page counts of decoded fragments, in the shape the resolver expects.
pub fn fragment_layout<C: DocumentCodec>(
    codec: &C,
    fragments: &DecodedFragments<C::Document>,
) -> FragmentLayout {
    fragments
        .iter()
        .map(|(key, docs)| {
            let counts = docs.iter().map(|doc| codec.page_count(doc) as u32).collect();
            (*key, counts)
        })
        .collect()
}

/// Copies the resolved pages, in order, into a fresh document.
pub fn materialize<C: DocumentCodec>(
    codec: &C,
    original: &C::Document,
    fragments: &DecodedFragments<C::Document>,
    sources: &[PageSource],
) -> std::result::Result<Vec<u8>, CodecError> {
    let handles = sources
        .iter()
        .map(|source| match *source {
            PageSource::Original { page } => codec.copy_page(original, page as usize - 1),
            PageSource::Fragment { key, blob, page } => {
                let document = fragments.get(&key).and_then(|docs| docs.get(blob)).ok_or_else(|| {
                    CodecError::Encode(format!("no decoded fragment {}#{}", key, blob))
                })?;
                codec.copy_page(document, page as usize - 1)
            }
        })
        .collect::<std::result::Result<Vec<PageHandle<'_, C::Document>>, _>>()?;

    codec.encode(&handles)
}

/// Runs a full commit computation against an original document: validate,
/// decode fragments, resolve, materialize. Nothing is stored here.
pub fn compose<C: DocumentCodec>(
    codec: &C,
    original: &C::Document,
    plan: &CompositionPlan,
) -> Result<Composition> {
    let page_count = codec.page_count(original) as u32;

    // Cheap structural checks first, so a bad plan costs no decoding.
    plan.validate(page_count)?;

    let fragments = decode_fragments(codec, plan)?;
    let layout = fragment_layout(codec, &fragments);
    let sources = resolve::resolve(plan, page_count, &layout)?;
    let bytes = materialize(codec, original, &fragments, &sources)?;

    log::debug!(
        "Composed {} pages ({} bytes) from {} fragment blobs",
        sources.len(),
        bytes.len(),
        plan.fragment_count()
    );
    Ok(Composition { bytes, sources })
}

/// Concatenates whole documents in input order. Zero-page inputs contribute
/// nothing and are not an error.
pub fn merge<C: DocumentCodec>(
    codec: &C,
    documents: &[C::Document],
) -> std::result::Result<Composition, CodecError> {
    let mut handles = Vec::new();
    let mut sources = Vec::new();
    for (doc_index, document) in documents.iter().enumerate() {
        for index in 0..codec.page_count(document) {
            handles.push(codec.copy_page(document, index)?);
            sources.push(PageSource::Fragment {
                key: InsertionKey::new(0, doc_index as u32),
                blob: 0,
                page: index as u32 + 1,
            });
        }
    }

    let bytes = codec.encode(&handles)?;
    log::debug!("Merged {} documents into {} pages", documents.len(), handles.len());
    Ok(Composition { bytes, sources })
}
