//! This module holds the live candidate sets for each slot. Domains only ever shrink, except when
//! a caller explicitly puts words back -- either directly with `restore` or by rolling back to a
//! checkpoint, which is how the search undoes its inferences when it backtracks.

use smallvec::SmallVec;
use std::collections::BTreeSet;

use crate::grid_config::PuzzleStructure;
use crate::types::{SlotId, WordId};
use crate::word_list::WordList;

/// The set of words still considered possible for one slot. Iteration is in `WordId` order,
/// which keeps everything downstream deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Domain {
    words: BTreeSet<WordId>,
}

impl Domain {
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn contains(&self, word_id: WordId) -> bool {
        self.words.contains(&word_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = WordId> + '_ {
        self.words.iter().copied()
    }

    /// The only remaining word, if exactly one is left.
    #[must_use]
    pub fn single(&self) -> Option<WordId> {
        if self.words.len() == 1 {
            self.words.first().copied()
        } else {
            None
        }
    }
}

impl FromIterator<WordId> for Domain {
    fn from_iter<T: IntoIterator<Item = WordId>>(iter: T) -> Self {
        Domain {
            words: iter.into_iter().collect(),
        }
    }
}

/// A position in the removal trail that the store can be rolled back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// What `enforce_node_consistency` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConsistencyReport {
    /// How many (slot, word) pairs were removed.
    pub removed: usize,

    /// Slots left with no words of their length, in slot order.
    pub empty_slots: SmallVec<[SlotId; 4]>,
}

/// Per-slot domains plus a trail of every removal made since the last `commit`.
#[derive(Debug, Clone)]
pub struct DomainStore {
    domains: Vec<Domain>,
    trail: Vec<(SlotId, WordId)>,
}

impl DomainStore {
    /// Give every slot the entire vocabulary as its domain.
    #[must_use]
    pub fn initialize(structure: &PuzzleStructure, word_list: &WordList) -> DomainStore {
        DomainStore {
            domains: (0..structure.slot_count())
                .map(|_| (0..word_list.len()).collect())
                .collect(),
            trail: vec![],
        }
    }

    /// Remove every word whose length differs from its slot's length. This never fails; slots that
    /// end up empty are reported so the caller can decide what that means.
    pub fn enforce_node_consistency(
        &mut self,
        structure: &PuzzleStructure,
        word_list: &WordList,
    ) -> NodeConsistencyReport {
        let mut report = NodeConsistencyReport::default();

        for slot_config in &structure.slot_configs {
            let slot_id = slot_config.id;
            let wrong_length: Vec<WordId> = self.domains[slot_id]
                .iter()
                .filter(|&word_id| word_list.get_word(word_id).len() != slot_config.length)
                .collect();

            for word_id in wrong_length {
                self.remove(slot_id, word_id);
                report.removed += 1;
            }

            if self.domains[slot_id].is_empty() {
                report.empty_slots.push(slot_id);
            }
        }

        report
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.domains.len()
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> &Domain {
        &self.domains[slot_id]
    }

    /// Remove a word from a slot's domain, recording it on the trail. Returns false if the word
    /// wasn't there.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        let removed = self.domains[slot_id].words.remove(&word_id);
        if removed {
            self.trail.push((slot_id, word_id));
        }
        removed
    }

    /// Put words back into a slot's domain.
    pub fn restore(&mut self, slot_id: SlotId, word_ids: impl IntoIterator<Item = WordId>) {
        self.domains[slot_id].words.extend(word_ids);
    }

    /// The first slot with an empty domain, if any.
    #[must_use]
    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.domains.iter().position(Domain::is_empty)
    }

    /// Mark the current trail position so that later removals can be undone.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.trail.len())
    }

    /// Reinstate every word removed since `checkpoint`, most recent first.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.trail.len() > checkpoint.0 {
            if let Some((slot_id, word_id)) = self.trail.pop() {
                self.domains[slot_id].words.insert(word_id);
            }
        }
    }

    /// Forget the trail, making every removal so far permanent. Used once the pre-search
    /// propagation is finished, since the search never backtracks past its root.
    pub fn commit(&mut self) {
        self.trail.clear();
    }
}
