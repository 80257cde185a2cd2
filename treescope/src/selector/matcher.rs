//! Selector evaluation against a [`HostTree`].
//!
//! Each OR branch is evaluated with its own full pre-order walk. The anchor
//! compound's `nth` is resolved against the running match count of that
//! walk, so `:nth-of-type(2)` means "the second match anywhere in the tree",
//! not "the second among its siblings".

use treescope_common::MatchedRecord;

use super::parser::{Combinator, ComplexSelector, CompoundSelector, Nth};
use crate::accessor::{self, Capabilities};
use crate::domain::NodeId;
use crate::host::{HostTree, WalkEntry};

/// Does `id` satisfy every predicate present in `compound`?
#[must_use]
pub fn matches_compound(
    tree: &HostTree,
    id: NodeId,
    compound: &CompoundSelector,
    max_depth: usize,
) -> bool {
    let Some(node) = tree.get(id) else { return false };

    if compound.type_name.as_deref().is_some_and(|t| accessor::type_name(node) != t) {
        return false;
    }
    if compound.display_name.is_some() && node.display_name != compound.display_name {
        return false;
    }
    if compound.identifier.is_some() && node.identifier() != compound.identifier {
        return false;
    }
    let attrs_match = compound.attrs.iter().all(|attr| {
        node.prop(&attr.name).is_some_and(|v| v.coerce_string() == attr.value)
    });
    if !attrs_match {
        return false;
    }
    if compound.has_press || compound.has_scroll {
        let caps = Capabilities::of(node);
        if (compound.has_press && !caps.press) || (compound.has_scroll && !caps.scroll) {
            return false;
        }
    }
    // Text last: it walks the subtree
    if let Some(needle) = &compound.text {
        let text = accessor::collect_text(tree, id, max_depth);
        if !text.is_some_and(|t| t.contains(needle.as_str())) {
            return false;
        }
    }
    true
}

/// Anchor the last segment on `id`, then walk backward through the chain.
#[must_use]
pub fn matches_complex(
    tree: &HostTree,
    id: NodeId,
    complex: &ComplexSelector,
    max_depth: usize,
) -> bool {
    let Some((anchor, rest)) = complex.segments.split_last() else { return false };
    if !matches_compound(tree, id, &anchor.compound, max_depth) {
        return false;
    }

    let mut current = id;
    let mut combinator = anchor.combinator;
    for segment in rest.iter().rev() {
        let found = match combinator {
            Some(Combinator::Child) => tree
                .parent(current)
                .filter(|p| matches_compound(tree, *p, &segment.compound, max_depth)),
            Some(Combinator::Descendant) => tree
                .ancestors(current)
                .find(|a| matches_compound(tree, *a, &segment.compound, max_depth)),
            // Only the first segment lacks a combinator, and it is never behind another
            None => None,
        };
        let Some(next) = found else { return false };
        current = next;
        combinator = segment.combinator;
    }
    true
}

/// Matches of one branch, in traversal order, after `nth` selection.
#[must_use]
pub fn select_branch(tree: &HostTree, complex: &ComplexSelector, max_depth: usize) -> Vec<WalkEntry> {
    let nth = complex.anchor().map(|a| a.nth).unwrap_or_default();
    let mut selected = Vec::new();
    let mut count = 0;

    for entry in tree.walk(max_depth) {
        if !matches_complex(tree, entry.id, complex, max_depth) {
            continue;
        }
        match nth {
            Nth::All => selected.push(entry),
            Nth::Index(n) if n == count => {
                selected.push(entry);
                break;
            }
            Nth::Index(_) => {}
            Nth::Last => {
                selected.clear();
                selected.push(entry);
            }
        }
        count += 1;
    }
    selected
}

/// Merge records sharing a uid, keeping the first position.
///
/// A later duplicate replaces the kept record when its capabilities rank
/// higher: scrollable first, then pressable.
#[must_use]
pub fn dedupe_by_uid(records: Vec<MatchedRecord>) -> Vec<MatchedRecord> {
    fn rank(r: &MatchedRecord) -> (bool, bool, bool) {
        (r.has_scrollable, r.has_on_press, r.has_on_long_press)
    }

    let mut out: Vec<MatchedRecord> = Vec::with_capacity(records.len());
    for record in records {
        match out.iter_mut().find(|kept| kept.uid == record.uid) {
            Some(kept) if rank(&record) > rank(kept) => *kept = record,
            Some(_) => {}
            None => out.push(record),
        }
    }
    out
}
