//! Plan vocabulary shared between the engine and its callers.
//!
//! Page numbers are 1-based everywhere in this module, matching the numbering
//! a user sees.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one group of fragment blobs inside a composition plan.
///
/// `anchor` is the original page after which the group is spliced under
/// default ordering (`0` means before the first page). `slot` separates
/// several independent groups sharing one anchor; groups at the same anchor
/// are spliced in ascending slot order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct InsertionKey {
    pub anchor: u32,
    #[serde(default)]
    pub slot: u32,
}

impl InsertionKey {
    pub fn new(anchor: u32, slot: u32) -> Self {
        Self { anchor, slot }
    }

    /// The first slot at `anchor`.
    pub fn after(anchor: u32) -> Self {
        Self { anchor, slot: 0 }
    }
}

impl fmt::Display for InsertionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.anchor, self.slot)
    }
}

/// One entry of an explicit output ordering.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlanItem {
    /// A page of the original document.
    Page { number: u32 },
    /// Splice every blob of the fragment group at this key.
    Insert {
        anchor: u32,
        #[serde(default, alias = "fragmentIndex", alias = "fragment_index")]
        slot: u32,
    },
}

impl PlanItem {
    pub fn page(number: u32) -> Self {
        PlanItem::Page { number }
    }

    pub fn insert(key: InsertionKey) -> Self {
        PlanItem::Insert { anchor: key.anchor, slot: key.slot }
    }
}

/// Where a page of the composed output comes from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PageSource {
    Original { page: u32 },
    Fragment { key: InsertionKey, blob: usize, page: u32 },
}

impl PageSource {
    pub fn original(page: u32) -> Self {
        PageSource::Original { page }
    }

    /// The original page number, if this page comes from the original.
    pub fn original_page(&self) -> Option<u32> {
        match self {
            PageSource::Original { page } => Some(*page),
            PageSource::Fragment { .. } => None,
        }
    }
}

impl fmt::Display for PageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSource::Original { page } => write!(f, "orig:{}", page),
            PageSource::Fragment { key, blob, page } => {
                write!(f, "frag[{}#{}]:{}", key, blob, page)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_item_json_shape() {
        let items: Vec<PlanItem> = serde_json::from_str(
            r#"[
                {"kind": "page", "number": 3},
                {"kind": "insert", "anchor": 1, "fragmentIndex": 2},
                {"kind": "insert", "anchor": 4}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            items,
            vec![
                PlanItem::page(3),
                PlanItem::insert(InsertionKey::new(1, 2)),
                PlanItem::insert(InsertionKey::after(4)),
            ]
        );
    }

    #[test]
    fn test_insertion_keys_order_by_anchor_then_slot() {
        let mut keys = vec![
            InsertionKey::new(2, 0),
            InsertionKey::new(1, 5),
            InsertionKey::new(1, 0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![InsertionKey::new(1, 0), InsertionKey::new(1, 5), InsertionKey::new(2, 0)]
        );
    }

    #[test]
    fn test_page_source_display() {
        assert_eq!(PageSource::original(4).to_string(), "orig:4");
        let frag = PageSource::Fragment { key: InsertionKey::after(1), blob: 0, page: 2 };
        assert_eq!(frag.to_string(), "frag[1.0#0]:2");
        assert_eq!(frag.original_page(), None);
    }
}
