//! This module describes the static shape of a puzzle: which cells are fillable, which slots need
//! words, and where those slots cross each other. Nothing here changes once a `PuzzleStructure`
//! has been built, so the fill process can share it freely.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{GridCoord, SlotId, WordId};
use crate::word_list::WordList;

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    /// Offset a start cell by `distance` cells in this direction.
    #[must_use]
    pub fn step(self, (row, col): GridCoord, distance: usize) -> GridCoord {
        match self {
            Direction::Across => (row, col + distance),
            Direction::Down => (row + distance, col),
        }
    }

    /// `step`, or `None` if the resulting coordinate doesn't fit in a `usize`.
    #[must_use]
    pub fn checked_step(self, (row, col): GridCoord, distance: usize) -> Option<GridCoord> {
        match self {
            Direction::Across => Some((row, col.checked_add(distance)?)),
            Direction::Down => Some((row.checked_add(distance)?, col)),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Direction::Across => "across",
            Direction::Down => "down",
        }
    }
}

/// The character positions that have to agree between two overlapping slots: cell
/// `first_cell` of the first slot is the same grid cell as cell `second_cell` of the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Overlap {
    pub first_cell: usize,
    pub second_cell: usize,
}

impl Overlap {
    /// The same overlap seen from the other slot's side.
    #[must_use]
    pub fn reversed(self) -> Overlap {
        Overlap {
            first_cell: self.second_cell,
            second_cell: self.first_cell,
        }
    }
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct identifying a specific slot in the grid. Two specs are the same slot if they start
/// in the same cell and face the same way; the length is only checked against the geometry.
#[derive(Debug, Clone)]
pub struct SlotSpec {
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl PartialEq for SlotSpec {
    fn eq(&self, other: &Self) -> bool {
        self.start_cell == other.start_cell && self.direction == other.direction
    }
}

impl Eq for SlotSpec {}

impl Hash for SlotSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start_cell.hash(state);
        self.direction.hash(state);
    }
}

impl SlotSpec {
    /// Parse a string like "1,2,down,5" (row, column, direction, length) into a `SlotSpec`.
    pub fn from_key(key: &str) -> Result<SlotSpec, String> {
        let key_parts: Vec<&str> = key.split(',').map(str::trim).collect();
        if key_parts.len() != 4 {
            return Err(format!("invalid slot key: {key}"));
        }

        let row: Result<usize, _> = key_parts[0].parse();
        let col: Result<usize, _> = key_parts[1].parse();
        let direction: Option<Direction> = match key_parts[2] {
            "across" => Some(Direction::Across),
            "down" => Some(Direction::Down),
            _ => None,
        };
        let length: Result<usize, _> = key_parts[3].parse();

        if let (Ok(row), Ok(col), Some(direction), Ok(length)) = (row, col, direction, length) {
            Ok(SlotSpec {
                start_cell: (row, col),
                direction,
                length,
            })
        } else {
            Err(format!("invalid slot key: {key:?}"))
        }
    }

    /// Represent this slot as a string like "1,2,down,5".
    #[must_use]
    pub fn to_key(&self) -> String {
        format!(
            "{},{},{},{}",
            self.start_cell.0,
            self.start_cell.1,
            self.direction.name(),
            self.length,
        )
    }

    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| self.direction.step(self.start_cell, cell_idx))
            .collect()
    }
}

impl fmt::Display for SlotSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

/// Serialize a `SlotSpec` into a string key.
#[cfg(feature = "serde")]
impl Serialize for SlotSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

/// Deserialize a `SlotSpec` from a string key.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SlotSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_string = String::deserialize(deserializer)?;
        SlotSpec::from_key(&raw_string).map_err(serde::de::Error::custom)
    }
}

/// Ways a grid description can fail to describe a usable puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedStructureError {
    EmptyGrid,
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
    CellCountMismatch {
        expected: usize,
        found: usize,
    },
    InvalidCell {
        cell: GridCoord,
        found: char,
    },
    ZeroLengthSlot(SlotSpec),
    SlotOutOfBounds(SlotSpec),
    SlotCoversBlock {
        slot: SlotSpec,
        cell: GridCoord,
    },
    SlotLengthMismatch {
        slot: SlotSpec,
        span: usize,
    },
    DuplicateSlot(SlotSpec),
}

impl fmt::Display for MalformedStructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedStructureError::EmptyGrid => write!(f, "Grid must have at least one cell"),
            MalformedStructureError::RaggedRows {
                row,
                expected,
                found,
            } => write!(
                f,
                "Row {row} has {found} cells, but rows must all have {expected} cells"
            ),
            MalformedStructureError::CellCountMismatch { expected, found } => write!(
                f,
                "Grid dimensions call for {expected} cells, but {found} were given"
            ),
            MalformedStructureError::InvalidCell { cell, found } => {
                write!(f, "Unrecognized cell {found:?} at {cell:?}")
            }
            MalformedStructureError::ZeroLengthSlot(slot) => {
                write!(f, "Slot {slot} has length zero")
            }
            MalformedStructureError::SlotOutOfBounds(slot) => {
                write!(f, "Slot {slot} extends outside the grid")
            }
            MalformedStructureError::SlotCoversBlock { slot, cell } => {
                write!(f, "Slot {slot} covers the blocked cell {cell:?}")
            }
            MalformedStructureError::SlotLengthMismatch { slot, span } => write!(
                f,
                "Slot {slot} declares length {}, but its run of open cells has length {span}",
                slot.length
            ),
            MalformedStructureError::DuplicateSlot(slot) => {
                write!(f, "Slot {slot} is declared more than once")
            }
        }
    }
}

impl std::error::Error for MalformedStructureError {}

/// The raw geometry of a grid: its dimensions, which cells can hold letters, and which runs of
/// cells are slots. This is what template parsers produce; it hasn't been validated against
/// itself until it's turned into a `PuzzleStructure`.
#[derive(Debug, Clone)]
pub struct GridGeometry {
    pub width: usize,
    pub height: usize,

    /// A flat array of cells, in order of row and then column; `false` represents a block.
    pub fillable: Vec<bool>,

    pub slots: Vec<SlotSpec>,
}

impl GridGeometry {
    /// Build a geometry from explicit parts, checking that the dimensions agree with each other.
    pub fn new(
        width: usize,
        height: usize,
        fillable: Vec<bool>,
        slots: Vec<SlotSpec>,
    ) -> Result<GridGeometry, MalformedStructureError> {
        if width == 0 || height == 0 {
            return Err(MalformedStructureError::EmptyGrid);
        }
        if fillable.len() != width * height {
            return Err(MalformedStructureError::CellCountMismatch {
                expected: width * height,
                found: fillable.len(),
            });
        }

        Ok(GridGeometry {
            width,
            height,
            fillable,
            slots,
        })
    }

    /// Parse a template string with `#` representing blocks and `_` or `.` representing open
    /// cells, deriving one slot for every run of two or more open cells.
    pub fn from_template(template: &str) -> Result<GridGeometry, MalformedStructureError> {
        let rows: Vec<Vec<char>> = template
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect())
            .collect();

        let Some(width) = rows.first().map(Vec::len) else {
            return Err(MalformedStructureError::EmptyGrid);
        };

        let mut fillable: Vec<bool> = Vec::with_capacity(width * rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(MalformedStructureError::RaggedRows {
                    row: row_idx,
                    expected: width,
                    found: row.len(),
                });
            }
            for (col_idx, &cell) in row.iter().enumerate() {
                fillable.push(match cell {
                    '#' => false,
                    '_' | '.' => true,
                    found => {
                        return Err(MalformedStructureError::InvalidCell {
                            cell: (row_idx, col_idx),
                            found,
                        })
                    }
                });
            }
        }

        let height = rows.len();
        let slots = generate_slots_from_cells(&fillable, width, height);

        GridGeometry::new(width, height, fillable, slots)
    }

    /// Is the given cell inside the grid and open?
    #[must_use]
    pub fn is_fillable(&self, (row, col): GridCoord) -> bool {
        row < self.height && col < self.width && self.fillable[row * self.width + col]
    }

    /// The length of the maximal run of open cells in `direction` that contains `cell`.
    #[must_use]
    pub fn run_length(&self, cell: GridCoord, direction: Direction) -> usize {
        if !self.is_fillable(cell) {
            return 0;
        }

        let mut start = cell;
        loop {
            let previous = match direction {
                Direction::Across if start.1 > 0 => (start.0, start.1 - 1),
                Direction::Down if start.0 > 0 => (start.0 - 1, start.1),
                _ => break,
            };
            if !self.is_fillable(previous) {
                break;
            }
            start = previous;
        }

        (0..)
            .take_while(|&distance| self.is_fillable(direction.step(start, distance)))
            .count()
    }
}

/// Derive slot specs from a cell mask: every run of two or more open cells, across runs first in
/// row-major order, then down runs in column-major order.
fn generate_slots_from_cells(fillable: &[bool], width: usize, height: usize) -> Vec<SlotSpec> {
    fn build_runs(
        line_count: usize,
        line_length: usize,
        is_open: impl Fn(usize, usize) -> bool,
    ) -> Vec<(usize, usize, usize)> {
        let mut result = vec![];

        for line in 0..line_count {
            let mut run_start: Option<usize> = None;

            for position in 0..=line_length {
                let open = position < line_length && is_open(line, position);
                match (open, run_start) {
                    (true, None) => run_start = Some(position),
                    (false, Some(start)) => {
                        if position - start > 1 {
                            result.push((line, start, position - start));
                        }
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }

        result
    }

    let mut slot_specs: Vec<SlotSpec> = vec![];

    for (row, col, length) in build_runs(height, width, |row, col| fillable[row * width + col]) {
        slot_specs.push(SlotSpec {
            start_cell: (row, col),
            direction: Direction::Across,
            length,
        });
    }

    for (col, row, length) in build_runs(width, height, |col, row| fillable[row * width + col]) {
        slot_specs.push(SlotSpec {
            start_cell: (row, col),
            direction: Direction::Down,
            length,
        });
    }

    slot_specs
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,

    /// The clue number printed in the slot's first cell.
    pub number: u32,

    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,

    /// For each cell of the slot, the slot crossing it there, if any.
    pub crossings: Vec<Option<Crossing>>,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        self.slot_spec().cell_coords()
    }

    /// Generate a `SlotSpec` identifying this slot.
    #[must_use]
    pub fn slot_spec(&self) -> SlotSpec {
        SlotSpec {
            start_cell: self.start_cell,
            direction: self.direction,
            length: self.length,
        }
    }

    /// The ids of all slots crossing this one, in cell order.
    pub fn neighbors(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.crossings
            .iter()
            .flatten()
            .map(|crossing| crossing.other_slot_id)
    }

    /// The number of slots crossing this one.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.crossings.iter().flatten().count()
    }
}

/// The validated, immutable description of a puzzle: its slots and the overlap graph between
/// them.
#[derive(Debug, Clone)]
pub struct PuzzleStructure {
    pub width: usize,
    pub height: usize,
    pub fillable: Vec<bool>,
    pub slot_configs: Vec<SlotConfig>,

    /// Every overlap, keyed in both orientations so that `overlaps[&(x, y)].first_cell` is always
    /// the cell index within `x`.
    overlaps: HashMap<(SlotId, SlotId), Overlap>,
}

impl PuzzleStructure {
    /// Validate a geometry and derive numbering, crossings, and overlaps from it.
    pub fn new(geometry: GridGeometry) -> Result<PuzzleStructure, MalformedStructureError> {
        let mut seen_slots: HashSet<&SlotSpec> = HashSet::new();

        for slot in &geometry.slots {
            validate_slot(&geometry, slot)?;

            if !seen_slots.insert(slot) {
                return Err(MalformedStructureError::DuplicateSlot(slot.clone()));
            }
        }

        // Build a map from cell location to the slots passing through it, which we can then use to
        // calculate crossings. Each entry is (slot id, cell index within slot).
        let mut slots_by_cell: HashMap<GridCoord, Vec<(SlotId, usize)>> = HashMap::new();
        for (slot_id, slot) in geometry.slots.iter().enumerate() {
            for (cell_idx, loc) in slot.cell_coords().into_iter().enumerate() {
                slots_by_cell.entry(loc).or_default().push((slot_id, cell_idx));
            }
        }

        // Since every slot spans exactly one maximal run, a cell is covered by at most one across
        // slot and one down slot, so each entry here has one or two slots.
        let mut overlaps: HashMap<(SlotId, SlotId), Overlap> = HashMap::new();
        for entries in slots_by_cell.values() {
            if let &[(first, first_cell), (second, second_cell)] = entries.as_slice() {
                let overlap = Overlap {
                    first_cell,
                    second_cell,
                };
                overlaps.insert((first, second), overlap);
                overlaps.insert((second, first), overlap.reversed());
            }
        }

        // Number each cell that starts at least one slot, in reading order.
        let mut start_cells: Vec<GridCoord> = geometry
            .slots
            .iter()
            .map(|slot| slot.start_cell)
            .collect();
        start_cells.sort_unstable();
        start_cells.dedup();
        let number_by_cell: HashMap<GridCoord, u32> = start_cells
            .into_iter()
            .zip(1..)
            .collect();

        let slot_configs = geometry
            .slots
            .iter()
            .enumerate()
            .map(|(slot_id, slot)| SlotConfig {
                id: slot_id,
                number: number_by_cell[&slot.start_cell],
                start_cell: slot.start_cell,
                direction: slot.direction,
                length: slot.length,
                crossings: slot
                    .cell_coords()
                    .into_iter()
                    .map(|loc| {
                        slots_by_cell[&loc]
                            .iter()
                            .find(|&&(other_slot_id, _)| other_slot_id != slot_id)
                            .map(|&(other_slot_id, other_slot_cell)| Crossing {
                                other_slot_id,
                                other_slot_cell,
                            })
                    })
                    .collect(),
            })
            .collect();

        Ok(PuzzleStructure {
            width: geometry.width,
            height: geometry.height,
            fillable: geometry.fillable,
            slot_configs,
            overlaps,
        })
    }

    /// Parse and validate a template string in one step; see `GridGeometry::from_template`.
    pub fn from_template(template: &str) -> Result<PuzzleStructure, MalformedStructureError> {
        PuzzleStructure::new(GridGeometry::from_template(template)?)
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    #[must_use]
    pub fn slot(&self, slot_id: SlotId) -> &SlotConfig {
        &self.slot_configs[slot_id]
    }

    /// The overlap between `x` and `y`, oriented so that `first_cell` indexes into `x`.
    #[must_use]
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<Overlap> {
        self.overlaps.get(&(x, y)).copied()
    }

    /// Every ordered pair of distinct slots that share a cell, in slot order.
    #[must_use]
    pub fn arcs(&self) -> Vec<(SlotId, SlotId)> {
        self.slot_configs
            .iter()
            .flat_map(|slot_config| {
                slot_config
                    .neighbors()
                    .map(move |neighbor| (slot_config.id, neighbor))
            })
            .collect()
    }
}

fn validate_slot(geometry: &GridGeometry, slot: &SlotSpec) -> Result<(), MalformedStructureError> {
    if slot.length == 0 {
        return Err(MalformedStructureError::ZeroLengthSlot(slot.clone()));
    }

    let (start_row, start_col) = slot.start_cell;
    let in_bounds = start_row < geometry.height
        && start_col < geometry.width
        && slot
            .direction
            .checked_step(slot.start_cell, slot.length - 1)
            .is_some_and(|(end_row, end_col)| end_row < geometry.height && end_col < geometry.width);
    if !in_bounds {
        return Err(MalformedStructureError::SlotOutOfBounds(slot.clone()));
    }

    if let Some(cell) = slot
        .cell_coords()
        .into_iter()
        .find(|&cell| !geometry.is_fillable(cell))
    {
        return Err(MalformedStructureError::SlotCoversBlock {
            slot: slot.clone(),
            cell,
        });
    }

    let span = geometry.run_length(slot.start_cell, slot.direction);
    if span != slot.length {
        return Err(MalformedStructureError::SlotLengthMismatch {
            slot: slot.clone(),
            span,
        });
    }

    Ok(())
}

/// A struct recording a slot assignment made during a fill process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// Turn the given structure and fill choices into a rendered string, with `#` for blocks and `.`
/// for open cells that no choice covers.
#[must_use]
pub fn render_grid(structure: &PuzzleStructure, word_list: &WordList, choices: &[Choice]) -> String {
    let mut grid: Vec<char> = structure
        .fillable
        .iter()
        .map(|&fillable| if fillable { '.' } else { '#' })
        .collect();

    for &Choice { slot_id, word_id } in choices {
        let slot_config = structure.slot(slot_id);
        let word = word_list.get_word(word_id);

        for ((row, col), &glyph) in slot_config.cell_coords().into_iter().zip(&word.glyphs) {
            grid[row * structure.width + col] = word_list.glyphs[glyph];
        }
    }

    grid.chunks(structure.width)
        .map(|line| line.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// List the entries of a fill as numbered clue labels, like "3-down: SEVEN". When normalization
/// did more than change case, the source spelling follows in parentheses: "2-across: ICECREAM (ice
/// cream)".
#[must_use]
pub fn render_entries(
    structure: &PuzzleStructure,
    word_list: &WordList,
    choices: &[Choice],
) -> Vec<String> {
    let mut choices: Vec<&Choice> = choices.iter().collect();
    choices.sort_by_key(|choice| {
        let slot_config = structure.slot(choice.slot_id);
        (slot_config.direction, slot_config.number)
    });

    choices
        .into_iter()
        .map(|choice| {
            let slot_config = structure.slot(choice.slot_id);
            let word = word_list.get_word(choice.word_id);
            let label = format!(
                "{}-{}: {}",
                slot_config.number,
                slot_config.direction.name(),
                word.normalized_string
            );
            if word.canonical_string.to_uppercase() == word.normalized_string {
                label
            } else {
                format!("{label} ({})", word.canonical_string)
            }
        })
        .collect()
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use crate::grid_config::{Direction, SlotSpec};

    #[test]
    fn test_slot_spec_serialization() {
        let slot_spec = SlotSpec {
            start_cell: (1, 2),
            direction: Direction::Across,
            length: 5,
        };

        let slot_key = serde_json::to_string(&slot_spec).unwrap();

        assert_eq!(slot_key, "\"1,2,across,5\"");
    }

    #[test]
    fn test_slot_spec_deserialization() {
        let slot_spec: SlotSpec = serde_json::from_str("\"3,4,down,12\"").unwrap();

        assert_eq!(slot_spec.start_cell, (3, 4));
        assert_eq!(slot_spec.direction, Direction::Down);
        assert_eq!(slot_spec.length, 12);
    }
}
