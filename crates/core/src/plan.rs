//! The typed description of one commit's desired output.
//!
//! A [`CompositionPlan`] is built once at the request boundary and checked
//! against the session's page count by [`CompositionPlan::validate`] before
//! any fragment is decoded. Nothing downstream inspects raw request fields.

use crate::error::{PlanField, ValidationError};
use folio_types::{InsertionKey, PlanItem};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An uploaded document to be spliced into the output.
///
/// The bytes are owned by the plan and released when the commit that
/// consumes the plan returns, on success or failure.
#[derive(Clone, PartialEq, Eq)]
pub struct FragmentBlob {
    pub label: String,
    pub bytes: Vec<u8>,
}

impl FragmentBlob {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { label: label.into(), bytes }
    }
}

impl fmt::Debug for FragmentBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentBlob")
            .field("label", &self.label)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Removal set, optional explicit ordering and fragment groups for one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositionPlan {
    removed: BTreeSet<u32>,
    order: Vec<PlanItem>,
    fragments: BTreeMap<InsertionKey, Vec<FragmentBlob>>,
}

impl CompositionPlan {
    /// The identity plan: every original page, in order.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn builder() -> PlanBuilder {
        PlanBuilder::default()
    }

    pub fn removed(&self) -> &BTreeSet<u32> {
        &self.removed
    }

    pub fn order(&self) -> &[PlanItem] {
        &self.order
    }

    pub fn fragments(&self) -> &BTreeMap<InsertionKey, Vec<FragmentBlob>> {
        &self.fragments
    }

    /// Fragment groups keyed at `anchor`, in ascending slot order.
    pub fn fragments_at(
        &self,
        anchor: u32,
    ) -> impl Iterator<Item = (&InsertionKey, &Vec<FragmentBlob>)> {
        self.fragments
            .range(InsertionKey::new(anchor, 0)..=InsertionKey::new(anchor, u32::MAX))
    }

    /// Total number of fragment blobs across all groups.
    pub fn fragment_count(&self) -> usize {
        self.fragments.values().map(Vec::len).sum()
    }

    pub fn has_explicit_order(&self) -> bool {
        !self.order.is_empty()
    }

    /// Checks every page number and fragment reference against the
    /// original's page count. Out-of-range references are rejected, never
    /// clamped or dropped.
    pub fn validate(&self, page_count: u32) -> Result<(), ValidationError> {
        for &number in &self.removed {
            check_page(number, page_count, PlanField::Removed)?;
        }

        for key in self.fragments.keys() {
            if key.anchor > page_count {
                return Err(ValidationError::AnchorOutOfRange { key: *key, page_count });
            }
        }

        if self.order.is_empty() {
            return Ok(());
        }

        let mut placed = BTreeSet::new();
        for (position, item) in self.order.iter().enumerate() {
            match *item {
                PlanItem::Page { number } => {
                    check_page(number, page_count, PlanField::Order { position })?;
                }
                PlanItem::Insert { anchor, slot } => {
                    let key = InsertionKey::new(anchor, slot);
                    if !self.fragments.contains_key(&key) {
                        return Err(ValidationError::UnknownFragment { key, position });
                    }
                    placed.insert(key);
                }
            }
        }

        if let Some(key) = self.fragments.keys().find(|key| !placed.contains(*key)) {
            return Err(ValidationError::UnplacedFragment { key: *key });
        }

        Ok(())
    }
}

fn check_page(number: u32, page_count: u32, field: PlanField) -> Result<(), ValidationError> {
    if number == 0 || number > page_count {
        return Err(ValidationError::PageOutOfRange { number, page_count, field });
    }
    Ok(())
}

/// Fluent construction of a [`CompositionPlan`].
///
/// ```ignore
/// let plan = CompositionPlan::builder()
///     .remove(2)
///     .insert_after(1, FragmentBlob::new("cover.pdf", bytes))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct PlanBuilder {
    plan: CompositionPlan,
}

impl PlanBuilder {
    pub fn remove(mut self, page: u32) -> Self {
        self.plan.removed.insert(page);
        self
    }

    pub fn remove_all(mut self, pages: impl IntoIterator<Item = u32>) -> Self {
        self.plan.removed.extend(pages);
        self
    }

    /// Adds a blob to the first slot at `anchor`. Blobs added to the same key
    /// are spliced in the order they were added.
    pub fn insert_after(self, anchor: u32, blob: FragmentBlob) -> Self {
        self.insert_at(InsertionKey::after(anchor), blob)
    }

    pub fn insert_at(mut self, key: InsertionKey, blob: FragmentBlob) -> Self {
        self.plan.fragments.entry(key).or_default().push(blob);
        self
    }

    /// Declares a fragment group with no blobs yet, so an explicit order may
    /// reference it.
    pub fn declare_group(mut self, key: InsertionKey) -> Self {
        self.plan.fragments.entry(key).or_default();
        self
    }

    pub fn push(mut self, item: PlanItem) -> Self {
        self.plan.order.push(item);
        self
    }

    pub fn order(mut self, items: impl IntoIterator<Item = PlanItem>) -> Self {
        self.plan.order = items.into_iter().collect();
        self
    }

    pub fn build(self) -> CompositionPlan {
        self.plan
    }
}
