//! PDF composition utilities for building a document out of pages of others.
//!
//! This crate provides low-level PDF manipulation using lopdf:
//! - Deep object copying with cycle detection
//! - Page detaching (inherited attributes made explicit on the copy)
//! - Page tree assembly for an arbitrary, ordered list of pages

mod error;

pub use error::ComposerError;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

/// Page attributes that may be inherited from an ancestor `/Pages` node.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed page trees whose `/Parent` chain loops.
const MAX_TREE_DEPTH: usize = 64;

/// A helper struct to manage the state of copying objects between documents.
///
/// The `id_map` outlives a single copier so that resources shared by several
/// pages of one source (fonts, images) are copied into the target only once.
struct ObjectCopier<'a> {
    source_doc: &'a Document,
    target_doc: &'a mut Document,
    id_map: &'a mut HashMap<ObjectId, ObjectId>,
}

impl ObjectCopier<'_> {
    /// Copies one page dictionary into the target as a new, detached page.
    ///
    /// The page dictionary itself is always copied fresh, so the same source
    /// page requested twice yields two distinct page objects (sharing the
    /// copied resources). `/Parent` is dropped; the assembler re-parents it.
    fn copy_page(&mut self, page_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        let mut page = self.source_doc.get_dictionary(page_id)?.clone();
        inherit_attributes(self.source_doc, &mut page);
        page.remove(b"Parent");

        let remapped = self.remap_references(Object::Dictionary(page))?;
        Ok(self.target_doc.add_object(remapped))
    }

    /// Deep copies an object from the source document to the target document.
    /// It recursively copies all referenced objects, ensuring that each object
    /// is only copied once by tracking it in the `id_map`.
    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        // Reserve the target id before recursing so reference cycles
        // (e.g. an annotation pointing at its own appearance) terminate.
        let new_id = self.target_doc.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = self.source_doc.get_object(source_id)?.clone();
        let new_obj = self.remap_references(obj)?;

        match self.target_doc.objects.get_mut(&new_id) {
            Some(target_obj) => *target_obj = new_obj,
            None => return Err(lopdf::Error::ObjectNotFound(new_id)),
        }

        Ok(new_id)
    }

    /// Traverses an object and replaces any `Object::Reference` with a new ID
    /// from the target document by recursively calling `copy_object`.
    ///
    /// References to other pages or page tree nodes become `null`: only the
    /// pages explicitly requested end up in the output. Dangling references
    /// become `null` as well, which is how a PDF reader treats them.
    fn remap_references(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => match self.source_doc.get_object(id) {
                Err(_) => Ok(Object::Null),
                Ok(target) if is_page_tree_node(target) => Ok(Object::Null),
                Ok(_) => Ok(Object::Reference(self.copy_object(id)?)),
            },
            Object::Array(arr) => {
                let new_arr = arr
                    .into_iter()
                    .map(|o| self.remap_references(o))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Object::Array(new_arr))
            }
            Object::Dictionary(mut dict) => {
                self.remap_dictionary(&mut dict)?;
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                self.remap_dictionary(&mut stream.dict)?;
                Ok(Object::Stream(stream))
            }
            _ => Ok(obj),
        }
    }

    fn remap_dictionary(&mut self, dict: &mut Dictionary) -> Result<(), lopdf::Error> {
        for (_, value) in dict.iter_mut() {
            let taken = std::mem::replace(value, Object::Null);
            *value = self.remap_references(taken)?;
        }
        Ok(())
    }
}

fn is_page_tree_node(obj: &Object) -> bool {
    let Ok(dict) = obj.as_dict() else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Page") | Ok(b"Pages")
    )
}

/// Copies inheritable attributes from the page's ancestors onto the page
/// itself, so the page renders identically once detached from its tree.
fn inherit_attributes(source: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            log::warn!("Page tree deeper than {} levels; stopping inheritance walk", MAX_TREE_DEPTH);
            break;
        }
        depth += 1;

        let Ok(node) = source.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
}

/// Builds a fresh document from an ordered sequence of pages taken from any
/// number of source documents.
///
/// Each source is identified by a caller-chosen `source_key`; pages appended
/// with the same key share one copy of their common resources.
///
/// ```ignore
/// let mut assembler = PageAssembler::new("1.7");
/// assembler.append_page(0, &original, page_ids[0])?;
/// assembler.append_page(1, &fragment, fragment_ids[0])?;
/// let mut doc = assembler.finish();
/// doc.save_to(&mut bytes)?;
/// ```
pub struct PageAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    id_maps: Vec<HashMap<ObjectId, ObjectId>>,
}

impl PageAssembler {
    pub fn new(version: &str) -> Self {
        let mut doc = Document::with_version(version);
        let pages_id = doc.new_object_id();
        Self { doc, pages_id, kids: Vec::new(), id_maps: Vec::new() }
    }

    /// Appends a copy of `page_id` from `source` as the next output page.
    pub fn append_page(
        &mut self,
        source_key: usize,
        source: &Document,
        page_id: ObjectId,
    ) -> Result<(), ComposerError> {
        if self.id_maps.len() <= source_key {
            self.id_maps.resize_with(source_key + 1, HashMap::new);
        }

        let mut copier = ObjectCopier {
            source_doc: source,
            target_doc: &mut self.doc,
            id_map: &mut self.id_maps[source_key],
        };
        let new_page_id = copier.copy_page(page_id)?;
        self.kids.push(new_page_id);
        Ok(())
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Writes the page tree and catalog and returns the finished document.
    ///
    /// An assembler with no pages yields a valid, empty document.
    pub fn finish(mut self) -> Document {
        for page_id in &self.kids {
            if let Ok(Object::Dictionary(page_dict)) = self.doc.get_object_mut(*page_id) {
                page_dict.set("Parent", Object::Reference(self.pages_id));
            }
        }

        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.kids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        log::debug!("Assembled document with {} pages", self.kids.len());
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Stream, StringFormat};

    /// Creates a simple dummy PDF document with a specified number of pages.
    /// Each page has a unique text content "<prefix> X". Resources and
    /// MediaBox live on the `/Pages` node, so pages inherit them.
    fn create_dummy_pdf(num_pages: u32, text_prefix: &str) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut page_ids = vec![];
        for i in 1..=num_pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![100.into(), 700.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("{} {}", text_prefix, i).into_bytes(),
                            StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            page_ids.push(page_id.into());
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => num_pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, pages_dict.into());

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc
    }

    fn page_text(doc: &Document, page_num: u32) -> String {
        let pages = doc.get_pages();
        let content = doc.get_page_content(*pages.get(&page_num).unwrap()).unwrap();
        String::from_utf8_lossy(&content).into_owned()
    }

    fn count_fonts(doc: &Document) -> usize {
        doc.objects
            .values()
            .filter(|o| {
                o.as_dict()
                    .and_then(|d| d.get(b"Type"))
                    .and_then(Object::as_name)
                    .map(|n| n == b"Font")
                    .unwrap_or(false)
            })
            .count()
    }

    #[test]
    fn test_assemble_interleaves_sources_in_order() {
        let original = create_dummy_pdf(3, "Original Page");
        let fragment = create_dummy_pdf(2, "Fragment Page");
        let orig_pages = original.get_pages();
        let frag_pages = fragment.get_pages();

        let mut assembler = PageAssembler::new("1.7");
        assembler.append_page(0, &original, orig_pages[&1]).unwrap();
        assembler.append_page(1, &fragment, frag_pages[&1]).unwrap();
        assembler.append_page(1, &fragment, frag_pages[&2]).unwrap();
        assembler.append_page(0, &original, orig_pages[&3]).unwrap();
        assert_eq!(assembler.page_count(), 4);

        let doc = assembler.finish();
        assert_eq!(doc.get_pages().len(), 4);
        assert!(page_text(&doc, 1).contains("Original Page 1"));
        assert!(page_text(&doc, 2).contains("Fragment Page 1"));
        assert!(page_text(&doc, 3).contains("Fragment Page 2"));
        assert!(page_text(&doc, 4).contains("Original Page 3"));
    }

    #[test]
    fn test_shared_resources_are_copied_once_per_source() {
        let original = create_dummy_pdf(3, "Page");
        let pages = original.get_pages();

        let mut assembler = PageAssembler::new("1.7");
        for page_id in pages.values() {
            assembler.append_page(0, &original, *page_id).unwrap();
        }
        let doc = assembler.finish();

        assert_eq!(count_fonts(&doc), 1);
    }

    #[test]
    fn test_duplicate_page_yields_distinct_page_objects() {
        let original = create_dummy_pdf(2, "Page");
        let page_1 = original.get_pages()[&1];

        let mut assembler = PageAssembler::new("1.7");
        assembler.append_page(0, &original, page_1).unwrap();
        assembler.append_page(0, &original, page_1).unwrap();
        let doc = assembler.finish();

        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        assert_ne!(pages[&1], pages[&2]);
        assert!(page_text(&doc, 2).contains("Page 1"));
    }

    #[test]
    fn test_detached_page_carries_inherited_attributes() {
        let original = create_dummy_pdf(1, "Page");
        let page_id = original.get_pages()[&1];
        assert!(!original.get_dictionary(page_id).unwrap().has(b"MediaBox"));

        let mut assembler = PageAssembler::new("1.7");
        assembler.append_page(0, &original, page_id).unwrap();
        let doc = assembler.finish();

        let copied = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
        assert!(copied.has(b"MediaBox"));
        assert!(copied.has(b"Resources"));
    }

    #[test]
    fn test_back_references_to_other_pages_are_not_copied() {
        let mut original = create_dummy_pdf(3, "Page");
        let pages = original.get_pages();
        let (page_1, page_3) = (pages[&1], pages[&3]);

        // A link annotation on page 1 whose destination is page 3.
        let annot_id = original.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "P" => page_1,
            "Dest" => vec![Object::Reference(page_3), "Fit".into()],
        });
        original
            .get_object_mut(page_1)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Annots", vec![Object::Reference(annot_id)]);

        let mut assembler = PageAssembler::new("1.7");
        assembler.append_page(0, &original, page_1).unwrap();
        let doc = assembler.finish();

        let page_objects = doc
            .objects
            .values()
            .filter(|o| is_page_tree_node(o))
            .count();
        // One /Page plus the new /Pages root.
        assert_eq!(page_objects, 2);
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_empty_assembler_produces_valid_empty_document() {
        let mut doc = PageAssembler::new("1.7").finish();
        assert!(doc.get_pages().is_empty());

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert!(reloaded.get_pages().is_empty());
    }

    #[test]
    fn test_assembled_document_round_trips_through_bytes() {
        let original = create_dummy_pdf(2, "Saved Page");
        let mut assembler = PageAssembler::new("1.7");
        for page_id in original.get_pages().values() {
            assembler.append_page(0, &original, *page_id).unwrap();
        }
        let mut doc = assembler.finish();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);
        assert!(page_text(&reloaded, 2).contains("Saved Page 2"));
    }
}
