use smallvec::{smallvec, SmallVec};

use crate::types::{GlyphId, WordId};
use crate::word_list::WordList;
use crate::MAX_GLYPH_COUNT;

/// Structure tracking, for each cell of a slot, how many of the slot's remaining candidate words
/// have each glyph in that cell. `counts[cell_idx][glyph_id]`.
pub type GlyphCountsByCell = Vec<SmallVec<[u32; MAX_GLYPH_COUNT]>>;

/// Build the `GlyphCountsByCell` structure for a slot of the given length. Words that are too
/// short to reach a cell just don't contribute to it, so this is safe to call on domains that
/// haven't been made node-consistent yet.
pub fn build_glyph_counts_by_cell(
    word_list: &WordList,
    slot_length: usize,
    options: impl IntoIterator<Item = WordId>,
) -> GlyphCountsByCell {
    let mut result: GlyphCountsByCell = (0..slot_length)
        .map(|_| smallvec![0; word_list.glyphs.len()])
        .collect();

    for word_id in options {
        let word = word_list.get_word(word_id);
        for (cell_idx, &glyph) in word.glyphs.iter().take(slot_length).enumerate() {
            result[cell_idx][glyph] += 1;
        }
    }

    result
}

/// How many options in the counted slot have `glyph` in `cell_idx`?
#[must_use]
pub fn glyph_count(counts: &GlyphCountsByCell, cell_idx: usize, glyph: GlyphId) -> u32 {
    counts
        .get(cell_idx)
        .and_then(|cell_counts| cell_counts.get(glyph))
        .copied()
        .unwrap_or(0)
}
