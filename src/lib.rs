#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod grid_config;
pub mod types;
pub mod util;
pub mod word_list;

/// Re-run the full assignment check after every binding made during search, panicking if it ever
/// fails. Expensive; meant for debugging the search itself.
pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum number of distinct characters appearing in a vocabulary.
pub const MAX_GLYPH_COUNT: usize = 64;

/// The expected maximum number of slots crossing a single slot.
pub const MAX_NEIGHBOR_COUNT: usize = 21;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
