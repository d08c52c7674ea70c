//! Phase 1: turning a plan into the ordered list of output pages.
//!
//! Resolution is pure. It needs only the original's page count and the page
//! count of every fragment blob, so it runs (and is tested) without a codec.
//!
//! Without an explicit order the plan is first expanded into the natural
//! order (`[fragments@0] 1 [fragments@1] 2 [fragments@2] ...`) and then walked
//! by the same loop as an explicit order, so both paths share removal and
//! duplicate-page semantics.

use crate::error::ValidationError;
use crate::plan::CompositionPlan;
use folio_types::{InsertionKey, PageSource, PlanItem};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Page count of each decoded blob, per fragment group, in supplied order.
pub type FragmentLayout = BTreeMap<InsertionKey, Vec<u32>>;

/// The ordering used when a plan carries no explicit order.
pub fn default_order(plan: &CompositionPlan, page_count: u32) -> Vec<PlanItem> {
    let mut items = Vec::with_capacity(page_count as usize + plan.fragments().len());
    items.extend(plan.fragments_at(0).map(|(key, _)| PlanItem::insert(*key)));
    for page in 1..=page_count {
        items.push(PlanItem::page(page));
        items.extend(plan.fragments_at(page).map(|(key, _)| PlanItem::insert(*key)));
    }
    items
}

/// Resolves `plan` into the output page sequence.
///
/// Removal dominates ordering: a removed page is skipped even where the
/// explicit order names it. Pages may repeat if the order repeats them.
/// An empty result is legal.
pub fn resolve(
    plan: &CompositionPlan,
    page_count: u32,
    layout: &FragmentLayout,
) -> Result<Vec<PageSource>, ValidationError> {
    plan.validate(page_count)?;

    let order: Cow<'_, [PlanItem]> = if plan.has_explicit_order() {
        Cow::Borrowed(plan.order())
    } else {
        Cow::Owned(default_order(plan, page_count))
    };

    let mut resolved = Vec::with_capacity(order.len());
    for (position, item) in order.iter().enumerate() {
        match *item {
            PlanItem::Page { number } => {
                if !plan.removed().contains(&number) {
                    resolved.push(PageSource::original(number));
                }
            }
            PlanItem::Insert { anchor, slot } => {
                let key = InsertionKey::new(anchor, slot);
                let blobs = layout
                    .get(&key)
                    .ok_or(ValidationError::UnknownFragment { key, position })?;
                for (blob, &pages) in blobs.iter().enumerate() {
                    resolved.extend((1..=pages).map(|page| PageSource::Fragment { key, blob, page }));
                }
            }
        }
    }

    log::debug!(
        "Resolved {} output pages from {} plan items ({} removed)",
        resolved.len(),
        order.len(),
        plan.removed().len()
    );
    Ok(resolved)
}
