//! This module implements grid-filling as a depth-first backtracking search. Before searching we
//! make every domain node-consistent (right length) and arc-consistent (compatible with its
//! crossings), which alone is sometimes enough to prove a grid unfillable. The search then binds
//! one slot at a time:
//!
//! - Slots are chosen by minimum remaining values, breaking ties by degree and then by slot id.
//! - Words are tried in least-constraining-value order, skipping any word already in the grid.
//! - Each binding is checked against the constraints that touch the newly bound slot.
//!
//! Optionally, each binding is followed by a round of propagation (removing the word from other
//! slots and re-establishing arc consistency), which is undone through the domain store's trail
//! if the branch fails.

use log::{debug, trace};
use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use crate::arc_consistency::{ac3, Arc, ArcConsistencyFailure, ArcConsistencySuccess};
use crate::domains::DomainStore;
use crate::grid_config::{Choice, PuzzleStructure};
use crate::types::{SlotId, WordId};
use crate::util::{build_glyph_counts_by_cell, glyph_count, GlyphCountsByCell};
use crate::word_list::WordList;
use crate::{CHECK_INVARIANTS, MAX_NEIGHBOR_COUNT};

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// How many times the search was entered, i.e. how many partial assignments were visited.
    pub states: usize,

    /// How many tentative bindings were undone.
    pub backtracks: usize,

    pub node_consistency_eliminations: usize,
    pub initial_arc_consistency_eliminations: usize,
    pub total_time: Duration,
    pub initial_consistency_time: Duration,
    pub search_time: Duration,
}

/// Knobs for a single fill attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillOptions {
    /// After each binding, remove the chosen word from every other slot and re-establish arc
    /// consistency, rolling both back if the branch fails. This never changes whether a fill is
    /// found, only how much of the tree gets explored.
    pub maintain_arc_consistency: bool,
}

/// A (possibly partial) binding of words to slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    /// An empty assignment for a puzzle with `slot_count` slots.
    #[must_use]
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            words: vec![None; slot_count],
            assigned_count: 0,
        }
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    #[must_use]
    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words[slot_id].is_some()
    }

    /// Does every slot have a word?
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.words.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    /// Bind a word to a slot, replacing any previous binding.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        if self.words[slot_id].replace(word_id).is_none() {
            self.assigned_count += 1;
        }
    }

    /// Remove a slot's binding, returning the word it held.
    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        let previous = self.words[slot_id].take();
        if previous.is_some() {
            self.assigned_count -= 1;
        }
        previous
    }

    /// Is `word_id` bound to any slot other than `slot_id`?
    #[must_use]
    pub fn is_used_elsewhere(&self, word_id: WordId, slot_id: SlotId) -> bool {
        self.iter()
            .any(|(other_slot_id, other_word_id)| other_slot_id != slot_id && other_word_id == word_id)
    }

    /// The bound slots and their words, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    /// The bound slots as `Choice`s, in slot order.
    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.iter()
            .map(|(slot_id, word_id)| Choice { slot_id, word_id })
            .collect()
    }
}

/// Check every constraint touching `slot_id`: its word has the right length, no other slot holds
/// the same word, and every assigned crossing agrees on the shared letter. Unassigned slots
/// trivially pass.
#[must_use]
pub fn is_consistent_at(
    structure: &PuzzleStructure,
    word_list: &WordList,
    assignment: &Assignment,
    slot_id: SlotId,
) -> bool {
    let Some(word_id) = assignment.get(slot_id) else {
        return true;
    };
    let slot_config = structure.slot(slot_id);
    let word = word_list.get_word(word_id);

    if word.len() != slot_config.length || assignment.is_used_elsewhere(word_id, slot_id) {
        return false;
    }

    slot_config
        .crossings
        .iter()
        .zip(&word.glyphs)
        .all(|(crossing, &glyph)| {
            let Some(crossing) = crossing else {
                return true;
            };
            assignment
                .get(crossing.other_slot_id)
                .map_or(true, |other_word_id| {
                    word_list
                        .get_word(other_word_id)
                        .glyphs
                        .get(crossing.other_slot_cell)
                        == Some(&glyph)
                })
        })
}

/// Check the whole assignment: every bound slot satisfies its length, uniqueness, and overlap
/// constraints.
#[must_use]
pub fn is_consistent(
    structure: &PuzzleStructure,
    word_list: &WordList,
    assignment: &Assignment,
) -> bool {
    assignment
        .iter()
        .all(|(slot_id, _)| is_consistent_at(structure, word_list, assignment, slot_id))
}

/// A struct representing the results of a successful fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,

    /// One choice per slot, in slot order.
    pub choices: Vec<Choice>,
}

/// The ways a fill can be proven impossible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillFailure {
    /// These slots have no word of the right length in the vocabulary.
    NodeConsistency { slot_ids: Vec<SlotId> },

    /// Arc consistency emptied this slot's domain before any search.
    ArcConsistency { slot_id: SlotId },

    /// More slots of this length than distinct words left to fill them.
    NotEnoughWords { length: usize },

    /// The search tried every candidate at the root.
    Exhausted,
}

impl fmt::Display for FillFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillFailure::NodeConsistency { slot_ids } => {
                write!(f, "No words of the right length for slots {slot_ids:?}")
            }
            FillFailure::ArcConsistency { slot_id } => {
                write!(f, "No words for slot {slot_id} fit its crossings")
            }
            FillFailure::NotEnoughWords { length } => {
                write!(f, "Not enough distinct words of length {length}")
            }
            FillFailure::Exhausted => write!(f, "No assignment satisfies every constraint"),
        }
    }
}

impl std::error::Error for FillFailure {}

/// Everything one fill attempt owns: the domains being pruned, the assignment being built, and
/// counters. Nothing outlives the call to `find_fill` that creates it.
pub struct FillContext<'a> {
    structure: &'a PuzzleStructure,
    word_list: &'a WordList,
    options: FillOptions,
    domains: DomainStore,
    assignment: Assignment,
    statistics: Statistics,
}

impl<'a> FillContext<'a> {
    #[must_use]
    pub fn new(
        structure: &'a PuzzleStructure,
        word_list: &'a WordList,
        options: FillOptions,
    ) -> FillContext<'a> {
        FillContext {
            structure,
            word_list,
            options,
            domains: DomainStore::initialize(structure, word_list),
            assignment: Assignment::new(structure.slot_count()),
            statistics: Statistics::default(),
        }
    }

    #[must_use]
    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }

    #[must_use]
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Make every domain node- and arc-consistent, and check that each word length has at least
    /// as many candidate words as slots. Any failure here is final.
    pub fn establish_initial_consistency(&mut self) -> Result<(), FillFailure> {
        let start = Instant::now();

        let report = self
            .domains
            .enforce_node_consistency(self.structure, self.word_list);
        self.statistics.node_consistency_eliminations = report.removed;
        debug!("node consistency removed {} options", report.removed);

        if !report.empty_slots.is_empty() {
            return Err(FillFailure::NodeConsistency {
                slot_ids: report.empty_slots.to_vec(),
            });
        }

        let ArcConsistencySuccess {
            revisions,
            eliminations,
        } = ac3(self.structure, self.word_list, &mut self.domains, None)
            .map_err(|ArcConsistencyFailure { slot_id }| FillFailure::ArcConsistency { slot_id })?;
        self.statistics.initial_arc_consistency_eliminations = eliminations;
        debug!("arc consistency removed {eliminations} options in {revisions} revisions");

        self.check_word_supply()?;

        // The search never backtracks past this point.
        self.domains.commit();
        self.statistics.initial_consistency_time = start.elapsed();

        Ok(())
    }

    /// Global uniqueness means that `n` slots of some length need `n` distinct candidates between
    /// them.
    fn check_word_supply(&self) -> Result<(), FillFailure> {
        let mut lengths: Vec<usize> = self
            .structure
            .slot_configs
            .iter()
            .map(|slot_config| slot_config.length)
            .collect();
        lengths.sort_unstable();
        lengths.dedup();

        for length in lengths {
            let slot_ids: Vec<SlotId> = self
                .structure
                .slot_configs
                .iter()
                .filter(|slot_config| slot_config.length == length)
                .map(|slot_config| slot_config.id)
                .collect();

            let candidates: HashSet<WordId> = slot_ids
                .iter()
                .flat_map(|&slot_id| self.domains.get(slot_id).iter())
                .collect();

            if candidates.len() < slot_ids.len() {
                return Err(FillFailure::NotEnoughWords { length });
            }
        }

        Ok(())
    }

    /// Choose the unassigned slot with the fewest remaining options, preferring slots that cross
    /// more other slots, then lower slot ids. Returns `None` once every slot is assigned.
    #[must_use]
    pub fn select_unassigned_variable(&self) -> Option<SlotId> {
        (0..self.structure.slot_count())
            .filter(|&slot_id| !self.assignment.is_assigned(slot_id))
            .min_by_key(|&slot_id| {
                (
                    self.domains.get(slot_id).len(),
                    Reverse(self.structure.slot(slot_id).degree()),
                    slot_id,
                )
            })
    }

    /// List the usable options for a slot, least constraining first: a word's cost is the number
    /// of options it would rule out in the domains of unassigned crossing slots. Words already
    /// bound elsewhere are left out; ties keep vocabulary order.
    #[must_use]
    pub fn order_domain_values(&self, slot_id: SlotId) -> Vec<WordId> {
        struct Neighbor {
            cell_idx: usize,
            other_slot_cell: usize,
            option_count: u32,
            glyph_counts: GlyphCountsByCell,
        }

        let neighbors: SmallVec<[Neighbor; MAX_NEIGHBOR_COUNT]> = self
            .structure
            .slot(slot_id)
            .crossings
            .iter()
            .enumerate()
            .filter_map(|(cell_idx, crossing)| {
                let crossing = crossing.as_ref()?;
                if self.assignment.is_assigned(crossing.other_slot_id) {
                    return None;
                }
                let other_domain = self.domains.get(crossing.other_slot_id);
                Some(Neighbor {
                    cell_idx,
                    other_slot_cell: crossing.other_slot_cell,
                    option_count: other_domain.len() as u32,
                    glyph_counts: build_glyph_counts_by_cell(
                        self.word_list,
                        self.structure.slot(crossing.other_slot_id).length,
                        other_domain.iter(),
                    ),
                })
            })
            .collect();

        let mut options: Vec<(u32, WordId)> = self
            .domains
            .get(slot_id)
            .iter()
            .filter(|&word_id| !self.assignment.is_used_elsewhere(word_id, slot_id))
            .map(|word_id| {
                let glyphs = &self.word_list.get_word(word_id).glyphs;
                let ruled_out: u32 = neighbors
                    .iter()
                    .map(|neighbor| {
                        let compatible = glyphs.get(neighbor.cell_idx).map_or(0, |&glyph| {
                            glyph_count(&neighbor.glyph_counts, neighbor.other_slot_cell, glyph)
                        });
                        neighbor.option_count - compatible
                    })
                    .sum();
                (ruled_out, word_id)
            })
            .collect();

        options.sort_by_key(|&(ruled_out, _)| ruled_out);
        options.into_iter().map(|(_, word_id)| word_id).collect()
    }

    /// Propagate a binding that has just passed the consistency check. Returns false if that
    /// proves the branch dead. The caller is responsible for rolling the domains back.
    fn propagate_choice(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        if !self.options.maintain_arc_consistency {
            return true;
        }

        let others: Vec<WordId> = self
            .domains
            .get(slot_id)
            .iter()
            .filter(|&other| other != word_id)
            .collect();
        for other in others {
            self.domains.remove(slot_id, other);
        }

        // Start from the arcs pointing at the bound slot, plus arcs pointing at any slot that loses
        // the bound word to the uniqueness rule.
        let mut arcs: Vec<Arc> = self
            .structure
            .slot(slot_id)
            .neighbors()
            .map(|neighbor| (neighbor, slot_id))
            .collect();

        for other_slot_id in 0..self.structure.slot_count() {
            if other_slot_id == slot_id || !self.domains.remove(other_slot_id, word_id) {
                continue;
            }
            if self.domains.get(other_slot_id).is_empty() {
                trace!("uniqueness wiped out slot {other_slot_id}");
                return false;
            }
            arcs.extend(
                self.structure
                    .slot(other_slot_id)
                    .neighbors()
                    .map(|neighbor| (neighbor, other_slot_id)),
            );
        }

        ac3(self.structure, self.word_list, &mut self.domains, Some(arcs)).is_ok()
    }

    /// The recursive search. Returns true with `self.assignment` complete, or false with it exactly
    /// as it was on entry (and the domains too).
    fn backtrack(&mut self) -> bool {
        self.statistics.states += 1;

        let Some(slot_id) = self.select_unassigned_variable() else {
            return true;
        };

        for word_id in self.order_domain_values(slot_id) {
            self.assignment.assign(slot_id, word_id);

            if is_consistent_at(self.structure, self.word_list, &self.assignment, slot_id) {
                assert!(
                    !CHECK_INVARIANTS
                        || is_consistent(self.structure, self.word_list, &self.assignment),
                    "Inconsistent assignment after binding slot {slot_id}"
                );
                trace!(
                    "slot {slot_id} = {}",
                    self.word_list.get_word(word_id).normalized_string
                );

                let checkpoint = self.domains.checkpoint();
                if self.propagate_choice(slot_id, word_id) && self.backtrack() {
                    return true;
                }
                self.domains.rollback(checkpoint);
            }

            self.assignment.unassign(slot_id);
            self.statistics.backtracks += 1;
        }

        false
    }

    /// Run the search from the current (empty) assignment.
    pub fn search(&mut self) -> Result<Vec<Choice>, FillFailure> {
        let start = Instant::now();
        let found = self.backtrack();
        self.statistics.search_time = start.elapsed();

        if found {
            Ok(self.assignment.choices())
        } else {
            Err(FillFailure::Exhausted)
        }
    }
}

/// Search for a valid fill for the given puzzle. The result is either a complete, consistent
/// assignment or a proof (of one of several kinds) that none exists.
pub fn find_fill(
    structure: &PuzzleStructure,
    word_list: &WordList,
    options: FillOptions,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    let mut context = FillContext::new(structure, word_list, options);

    if let Err(failure) = context.establish_initial_consistency() {
        debug!("fill failed before search: {failure}");
        return Err(failure);
    }

    let result = context.search();
    context.statistics.total_time = start.elapsed();

    match result {
        Ok(choices) => {
            debug!("found fill: {:?}", context.statistics);
            Ok(FillSuccess {
                statistics: context.statistics,
                choices,
            })
        }
        Err(failure) => {
            debug!("search exhausted: {:?}", context.statistics);
            Err(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::arc_consistency::tests::assert_arc_consistent;
    use crate::backtracking_search::{
        find_fill, is_consistent, Assignment, FillContext, FillFailure, FillOptions,
    };
    use crate::grid_config::{render_entries, render_grid, Choice, PuzzleStructure};
    use crate::types::WordId;
    use crate::word_list::tests::resource_path;
    use crate::word_list::WordList;
    use std::fs;

    const CROSS: &str = "
        #_#
        ___
        #_#
    ";

    const BOTH_OPTIONS: [FillOptions; 2] = [
        FillOptions {
            maintain_arc_consistency: false,
        },
        FillOptions {
            maintain_arc_consistency: true,
        },
    ];

    fn load_structure0() -> (PuzzleStructure, WordList) {
        let template = fs::read_to_string(resource_path("structure0.txt")).unwrap();
        let words = fs::read_to_string(resource_path("words0.txt")).unwrap();
        (
            PuzzleStructure::from_template(&template).unwrap(),
            WordList::from_words(&words.lines().collect::<Vec<_>>()),
        )
    }

    fn fill_strings(word_list: &WordList, choices: &[Choice]) -> Vec<String> {
        choices
            .iter()
            .map(|choice| word_list.get_word(choice.word_id).normalized_string.clone())
            .collect()
    }

    fn to_assignment(slot_count: usize, choices: &[Choice]) -> Assignment {
        let mut assignment = Assignment::new(slot_count);
        for choice in choices {
            assignment.assign(choice.slot_id, choice.word_id);
        }
        assignment
    }

    /// Try every combination of words, slot by slot, pruning only on constraint violations.
    fn brute_force_exists(structure: &PuzzleStructure, word_list: &WordList) -> bool {
        fn extend(
            structure: &PuzzleStructure,
            word_list: &WordList,
            assignment: &mut Assignment,
            slot_id: usize,
        ) -> bool {
            if slot_id == structure.slot_count() {
                return true;
            }
            for word_id in 0..word_list.len() {
                assignment.assign(slot_id, word_id);
                if is_consistent(structure, word_list, assignment)
                    && extend(structure, word_list, assignment, slot_id + 1)
                {
                    return true;
                }
                assignment.unassign(slot_id);
            }
            false
        }

        extend(
            structure,
            word_list,
            &mut Assignment::new(structure.slot_count()),
            0,
        )
    }

    #[test]
    fn test_single_slot_takes_word_of_matching_length() {
        let structure = PuzzleStructure::from_template("___").unwrap();
        let word_list = WordList::from_words(&["cat", "dog", "ox"]);

        for options in BOTH_OPTIONS {
            let result = find_fill(&structure, &word_list, options).expect("Failed to find a fill");

            assert_eq!(result.choices.len(), 1);
            let word = fill_strings(&word_list, &result.choices).remove(0);
            assert!(word == "CAT" || word == "DOG", "unexpected word {word}");
        }
    }

    #[test]
    fn test_crossing_slots_share_their_letter() {
        let structure = PuzzleStructure::from_template(CROSS).unwrap();
        let word_list = WordList::from_words(&["cat", "car", "art"]);

        for options in BOTH_OPTIONS {
            let result = find_fill(&structure, &word_list, options).expect("Failed to find a fill");
            let assignment = to_assignment(structure.slot_count(), &result.choices);

            assert!(assignment.is_complete());
            assert!(is_consistent(&structure, &word_list, &assignment));

            let words = fill_strings(&word_list, &result.choices);
            assert_eq!(words[0].chars().nth(1), words[1].chars().nth(1));
            assert_ne!(words[0], words[1]);
        }
    }

    #[test]
    fn test_crossing_at_end_of_down_slot() {
        // The down slot's last cell is the across slot's middle cell.
        let structure = PuzzleStructure::from_template(
            "
            #_#
            #_#
            ___
            ",
        )
        .unwrap();
        let word_list = WordList::from_words(&["cat", "car", "art"]);

        for options in BOTH_OPTIONS {
            let result = find_fill(&structure, &word_list, options).expect("Failed to find a fill");

            assert_eq!(
                render_grid(&structure, &word_list, &result.choices),
                "#C#\n#A#\nART"
            );
        }
    }

    #[test]
    fn test_fill_for_structure0() {
        let (structure, word_list) = load_structure0();

        for options in BOTH_OPTIONS {
            let result = find_fill(&structure, &word_list, options).expect("Failed to find a fill");

            println!("{:?}", result.statistics);
            assert_eq!(
                render_grid(&structure, &word_list, &result.choices),
                "#SIX#\n#E##F\n#V##I\n#E##V\n#NINE"
            );
            assert_eq!(
                render_entries(&structure, &word_list, &result.choices),
                vec![
                    "1-across: SIX",
                    "3-across: NINE",
                    "1-down: SEVEN",
                    "2-down: FIVE"
                ]
            );
        }
    }

    #[test]
    fn test_missing_length_fails_before_search() {
        let structure = PuzzleStructure::from_template("___").unwrap();
        let word_list = WordList::from_words(&["ox", "horse"]);

        assert_eq!(
            find_fill(&structure, &word_list, FillOptions::default()).unwrap_err(),
            FillFailure::NodeConsistency { slot_ids: vec![0] }
        );
    }

    #[test]
    fn test_arc_consistency_failure_is_fatal() {
        let structure = PuzzleStructure::from_template(
            "
            #_##
            ____
            #_##
            ",
        )
        .unwrap();
        let word_list = WordList::from_words(&["abcd", "xyz"]);

        assert_eq!(
            find_fill(&structure, &word_list, FillOptions::default()).unwrap_err(),
            FillFailure::ArcConsistency { slot_id: 0 }
        );
    }

    #[test]
    fn test_fewer_words_than_slots_is_unsatisfiable() {
        let structure = PuzzleStructure::from_template("___\n###\n___").unwrap();
        let word_list = WordList::from_words(&["cat", "ox"]);

        assert_eq!(
            find_fill(&structure, &word_list, FillOptions::default()).unwrap_err(),
            FillFailure::NotEnoughWords { length: 3 }
        );

        let structure = PuzzleStructure::from_template(CROSS).unwrap();
        let word_list = WordList::from_words(&["aaa"]);

        assert_eq!(
            find_fill(&structure, &word_list, FillOptions::default()).unwrap_err(),
            FillFailure::NotEnoughWords { length: 3 }
        );
    }

    #[test]
    fn test_uniqueness_exhausts_search() {
        // Each word only crosses itself, which arc consistency accepts but uniqueness forbids.
        let structure = PuzzleStructure::from_template(CROSS).unwrap();
        let word_list = WordList::from_words(&["cat", "dog"]);

        for options in BOTH_OPTIONS {
            assert_eq!(
                find_fill(&structure, &word_list, options).unwrap_err(),
                FillFailure::Exhausted
            );
        }
    }

    #[test]
    fn test_failed_search_restores_domains() {
        let structure = PuzzleStructure::from_template(CROSS).unwrap();
        let word_list = WordList::from_words(&["cat", "dog"]);
        let mut context = FillContext::new(
            &structure,
            &word_list,
            FillOptions {
                maintain_arc_consistency: true,
            },
        );

        context.establish_initial_consistency().unwrap();
        let before: Vec<Vec<WordId>> = (0..2)
            .map(|slot_id| context.domains().get(slot_id).iter().collect())
            .collect();

        assert_eq!(context.search(), Err(FillFailure::Exhausted));

        let after: Vec<Vec<WordId>> = (0..2)
            .map(|slot_id| context.domains().get(slot_id).iter().collect())
            .collect();
        assert_eq!(before, after);
        assert!(context.assignment().is_empty());
        assert!(context.statistics.backtracks > 0);
    }

    #[test]
    fn test_select_unassigned_variable_breaks_ties() {
        let (structure, word_list) = load_structure0();
        let mut context = FillContext::new(&structure, &word_list, FillOptions::default());
        context
            .domains
            .enforce_node_consistency(&structure, &word_list);

        // Slots 1, 2 and 3 each have three options; 1 and 2 both cross two slots.
        assert_eq!(context.select_unassigned_variable(), Some(1));

        context.assignment.assign(1, word_list.word_id("nine").unwrap());
        assert_eq!(context.select_unassigned_variable(), Some(2));

        context.assignment.assign(2, word_list.word_id("seven").unwrap());
        assert_eq!(context.select_unassigned_variable(), Some(3));

        context.assignment.assign(3, word_list.word_id("five").unwrap());
        context.assignment.assign(0, word_list.word_id("six").unwrap());
        assert_eq!(context.select_unassigned_variable(), None);
        assert!(is_consistent(&structure, &word_list, &context.assignment));
    }

    #[test]
    fn test_select_unassigned_variable_prefers_higher_degree_over_lower_id() {
        // Every slot has three options. Slots 0 and 1 cross one slot each, while slot 2 crosses
        // both down slots.
        let structure = PuzzleStructure::from_template(
            "
            __#__
            #_#_#
            #___#
            ",
        )
        .unwrap();
        let word_list = WordList::from_words(&["ab", "cd", "ef", "abc", "def", "ghi"]);
        let mut context = FillContext::new(&structure, &word_list, FillOptions::default());
        context
            .domains
            .enforce_node_consistency(&structure, &word_list);

        assert_eq!(structure.slot(0).degree(), 1);
        assert_eq!(structure.slot(2).degree(), 2);
        assert!((0..structure.slot_count()).all(|slot_id| context.domains.get(slot_id).len() == 3));

        assert_eq!(context.select_unassigned_variable(), Some(2));
    }

    #[test]
    fn test_order_domain_values_prefers_least_constraining() {
        let structure = PuzzleStructure::from_template(CROSS).unwrap();
        let word_list = WordList::from_words(&["dog", "cat", "bat"]);
        let mut context = FillContext::new(&structure, &word_list, FillOptions::default());
        context
            .domains
            .enforce_node_consistency(&structure, &word_list);

        let order = |context: &FillContext| -> Vec<String> {
            context
                .order_domain_values(0)
                .into_iter()
                .map(|word_id| word_list.get_word(word_id).normalized_string.clone())
                .collect()
        };

        // DOG rules out two of the down slot's three options; CAT and BAT rule out one each.
        assert_eq!(order(&context), vec!["CAT", "BAT", "DOG"]);

        // Once the down slot is bound, its word is unavailable and no longer constrains anything.
        context.assignment.assign(1, word_list.word_id("cat").unwrap());
        assert_eq!(order(&context), vec!["DOG", "BAT"]);
    }

    #[test]
    fn test_assignment_consistency_checks() {
        let structure = PuzzleStructure::from_template(CROSS).unwrap();
        let word_list = WordList::from_words(&["cat", "car", "dog", "oxen"]);
        let id = |word: &str| word_list.word_id(word).unwrap();
        let mut assignment = Assignment::new(2);

        assignment.assign(0, id("cat"));
        assert!(is_consistent(&structure, &word_list, &assignment));
        assert!(!assignment.is_complete());

        assignment.assign(1, id("car"));
        assert!(is_consistent(&structure, &word_list, &assignment));
        assert!(assignment.is_complete());

        assignment.assign(1, id("cat"));
        assert!(!is_consistent(&structure, &word_list, &assignment), "reused word");

        assignment.assign(1, id("dog"));
        assert!(!is_consistent(&structure, &word_list, &assignment), "crossing mismatch");

        assignment.assign(1, id("oxen"));
        assert!(!is_consistent(&structure, &word_list, &assignment), "wrong length");

        assert_eq!(assignment.unassign(1), Some(id("oxen")));
        assert_eq!(assignment.len(), 1);
    }

    #[test]
    fn test_search_agrees_with_brute_force() {
        let cases: Vec<(&str, Vec<&str>)> = vec![
            (CROSS, vec!["cat", "dog", "tot", "ace"]),
            (CROSS, vec!["cat", "dog", "bat"]),
            (CROSS, vec!["abc", "xyz", "bye"]),
            (
                "
                ___
                _#_
                ___
                ",
                vec!["cab", "bet", "cot", "tot", "ten", "oat"],
            ),
            (
                "
                ___
                _#_
                ___
                ",
                vec!["cab", "bet", "cot", "ten", "oat"],
            ),
            (
                "
                ___
                ___
                ___
                ",
                vec!["bad", "ace", "den", "bed", "ace", "dan", "tan", "ant"],
            ),
            (
                "
                __#
                ___
                #__
                ",
                vec!["at", "to", "so", "ox", "sat", "tot", "ton", "no"],
            ),
        ];

        for (template, words) in cases {
            let structure = PuzzleStructure::from_template(template).unwrap();
            let word_list = WordList::from_words(&words);
            let expected = brute_force_exists(&structure, &word_list);

            for options in BOTH_OPTIONS {
                match find_fill(&structure, &word_list, options) {
                    Ok(result) => {
                        let assignment = to_assignment(structure.slot_count(), &result.choices);
                        assert!(expected, "found a fill brute force couldn't: {words:?}");
                        assert!(assignment.is_complete());
                        assert!(is_consistent(&structure, &word_list, &assignment));
                    }
                    Err(failure) => {
                        assert!(!expected, "missed a fill for {words:?}: {failure}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_initial_consistency_leaves_domains_arc_consistent() {
        let (structure, word_list) = load_structure0();
        let mut context = FillContext::new(&structure, &word_list, FillOptions::default());

        context.establish_initial_consistency().unwrap();

        assert_arc_consistent(&structure, &word_list, context.domains());
        assert!(context.statistics.node_consistency_eliminations > 0);
        assert!(context.statistics.initial_arc_consistency_eliminations > 0);
    }
}
