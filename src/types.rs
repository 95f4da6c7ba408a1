/// An identifier for a given letter or symbol, based on its index in the `WordList`'s `glyphs`
/// field.
pub type GlyphId = usize;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// An identifier for a given slot, based on its index in the `PuzzleStructure`'s `slots` field.
/// Ids follow slot creation order, which also serves as the final tie-break during search.
pub type SlotId = usize;

/// Zero-indexed `(row, col)` coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);
