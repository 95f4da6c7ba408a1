//! This module contains a crossword-specific implementation of the AC-3 algorithm for establishing
//! and maintaining arc consistency. For our purposes, an arc `(x, y)` is consistent when every
//! word left in `x`'s domain has at least one word in `y`'s domain with the same letter in the
//! cell the two slots share. For example, if 1D doesn't have any options starting with the letter
//! A, we want to remove any options for 1A that start with the letter A.
//!
//! We keep revising arcs until no more eliminations are possible, or until some slot runs out of
//! options, which proves that the grid can't be filled from the current domains.

use log::trace;
use smallvec::{smallvec, SmallVec};
use std::collections::{HashSet, VecDeque};

use crate::domains::DomainStore;
use crate::grid_config::PuzzleStructure;
use crate::types::{SlotId, WordId};
use crate::word_list::WordList;
use crate::MAX_GLYPH_COUNT;

/// An ordered pair of overlapping slots: revising it prunes the first slot against the second.
pub type Arc = (SlotId, SlotId);

/// Result from a successful call to `ac3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were popped off the queue and revised.
    pub revisions: usize,

    /// How many words were eliminated across all slots.
    pub eliminations: usize,
}

/// Result from a failed call to `ac3`, identifying the slot whose domain was wiped out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

/// Result from a call to `ac3`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make slot `x` arc-consistent with slot `y` by removing every word from `x`'s domain that has
/// no counterpart in `y`'s domain agreeing on their shared cell. Returns true if anything was
/// removed; slots that don't overlap are left alone.
pub fn revise(
    structure: &PuzzleStructure,
    word_list: &WordList,
    domains: &mut DomainStore,
    x: SlotId,
    y: SlotId,
) -> bool {
    revise_counting(structure, word_list, domains, x, y) > 0
}

/// `revise`, but returning the number of words removed.
fn revise_counting(
    structure: &PuzzleStructure,
    word_list: &WordList,
    domains: &mut DomainStore,
    x: SlotId,
    y: SlotId,
) -> usize {
    let Some(overlap) = structure.overlap(x, y) else {
        return 0;
    };

    // Which glyphs does `y` still offer in the shared cell?
    let mut supported: SmallVec<[bool; MAX_GLYPH_COUNT]> = smallvec![false; word_list.glyphs.len()];
    for word_id in domains.get(y).iter() {
        if let Some(&glyph) = word_list.get_word(word_id).glyphs.get(overlap.second_cell) {
            supported[glyph] = true;
        }
    }

    // Collect first and remove afterwards, since we can't shrink the domain we're walking.
    let unsupported: Vec<WordId> = domains
        .get(x)
        .iter()
        .filter(|&word_id| {
            word_list
                .get_word(word_id)
                .glyphs
                .get(overlap.first_cell)
                .map_or(true, |&glyph| !supported[glyph])
        })
        .collect();

    for &word_id in &unsupported {
        domains.remove(x, word_id);
    }

    unsupported.len()
}

/// Establish arc consistency with a worklist of arcs, starting from `initial_arcs` or, if that's
/// `None`, from every arc in the puzzle. Whenever a revision shrinks a slot's domain, the arcs
/// pointing at that slot from its other neighbors are queued again, since their support may be
/// gone. Fails as soon as any domain is empty, including one that was empty going in.
pub fn ac3(
    structure: &PuzzleStructure,
    word_list: &WordList,
    domains: &mut DomainStore,
    initial_arcs: Option<Vec<Arc>>,
) -> ArcConsistencyResult {
    if let Some(slot_id) = domains.first_empty_slot() {
        trace!("slot {slot_id} has an empty domain before propagation");
        return Err(ArcConsistencyFailure { slot_id });
    }

    let mut success = ArcConsistencySuccess::default();

    // `queued` mirrors the contents of `queue` so we never hold the same arc twice.
    let mut queue: VecDeque<Arc> = VecDeque::new();
    let mut queued: HashSet<Arc> = HashSet::new();
    for arc in initial_arcs.unwrap_or_else(|| structure.arcs()) {
        if queued.insert(arc) {
            queue.push_back(arc);
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        queued.remove(&(x, y));
        success.revisions += 1;

        let removed = revise_counting(structure, word_list, domains, x, y);
        if removed == 0 {
            continue;
        }
        success.eliminations += removed;

        if domains.get(x).is_empty() {
            trace!("domain of slot {x} wiped out while revising against slot {y}");
            return Err(ArcConsistencyFailure { slot_id: x });
        }

        for z in structure.slot(x).neighbors() {
            if z != y && queued.insert((z, x)) {
                queue.push_back((z, x));
            }
        }
    }

    Ok(success)
}
