use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fmt::Debug;
use std::{fmt, fs};
use unicode_normalization::UnicodeNormalization;

use crate::types::{GlyphId, WordId};
use crate::MAX_SLOT_LENGTH;

/// How many errors do we collect from a single source before giving up on it?
const MAX_ERRORS_PER_SOURCE: usize = 100;

/// A struct representing a word in the vocabulary.
#[derive(Debug, Clone)]
pub struct Word {
    /// The word as it would appear in a grid -- only uppercase letters or digits.
    pub normalized_string: String,

    /// The word as it appears in the source, before normalization.
    pub canonical_string: String,

    /// The glyph ids making up `normalized_string`.
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// The number of glyphs in the word, which is what slot lengths are compared against.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Given a canonical word string from a word file, turn it into the normalized form we'll use in
/// the actual fill engine.
#[must_use]
pub fn normalize_word(canonical: &str) -> String {
    canonical
        .to_uppercase()
        .nfc() // Normalize Unicode combining forms
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordListError {
    InvalidPath(String),
    InvalidWord(String),
}

impl fmt::Display for WordListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            WordListError::InvalidPath(path) => format!("Can’t read file: “{path}”"),
            WordListError::InvalidWord(word) => {
                format!("Word list contains invalid word: “{word}”")
            }
        };
        write!(f, "{string}")
    }
}

impl std::error::Error for WordListError {}

/// Configuration describing a source of vocabulary entries.
pub enum WordListSourceConfig {
    Memory {
        id: String,
        words: Vec<String>,
    },
    File {
        id: String,
        path: OsString,
    },
    FileContents {
        id: String,
        contents: &'static str,
    },
}

impl WordListSourceConfig {
    /// The unique id of this source, used to key its load errors.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            WordListSourceConfig::Memory { id, .. }
            | WordListSourceConfig::FileContents { id, .. }
            | WordListSourceConfig::File { id, .. } => id.clone(),
        }
    }
}

#[derive(Debug)]
pub struct WordListSourceState {
    pub id: String,
    pub errors: Vec<WordListError>,
}

/// A single vocabulary entry as read from a source.
struct RawWordListEntry {
    normalized: String,
    canonical: String,
}

/// Turn one raw line or in-memory word into an entry, recording an error if it can't be used.
/// Blank entries are skipped silently.
fn parse_entry(
    raw: &str,
    errors: &mut Vec<WordListError>,
) -> Option<RawWordListEntry> {
    let canonical = raw.trim();
    if canonical.is_empty() {
        return None;
    }

    let normalized = normalize_word(canonical);
    if !normalized.chars().all(char::is_alphanumeric) {
        errors.push(WordListError::InvalidWord(canonical.into()));
        return None;
    }

    Some(RawWordListEntry {
        normalized,
        canonical: canonical.to_string(),
    })
}

fn parse_entries<'a>(
    raw_entries: impl Iterator<Item = &'a str>,
    errors: &mut Vec<WordListError>,
) -> Vec<RawWordListEntry> {
    raw_entries
        .map_while(|raw| {
            if errors.len() > MAX_ERRORS_PER_SOURCE {
                return None;
            }
            Some(parse_entry(raw, errors))
        })
        .flatten()
        .collect()
}

fn load_words_from_source(
    source: &WordListSourceConfig,
) -> (Vec<RawWordListEntry>, WordListSourceState) {
    let id = source.id();
    let mut errors = vec![];

    let entries = match source {
        WordListSourceConfig::Memory { words, .. } => {
            parse_entries(words.iter().map(String::as_str), &mut errors)
        }

        WordListSourceConfig::File { path, .. } => {
            if let Ok(contents) = fs::read_to_string(path) {
                parse_entries(contents.lines(), &mut errors)
            } else {
                errors.push(WordListError::InvalidPath(path.to_string_lossy().into()));
                vec![]
            }
        }

        WordListSourceConfig::FileContents { contents, .. } => {
            parse_entries(contents.lines(), &mut errors)
        }
    };

    (entries, WordListSourceState { id, errors })
}

/// A struct representing the loaded vocabulary. Every word is usable at most once per fill, and
/// ids are dense and stable in load order, so `0..word_list.len()` is the full vocabulary.
pub struct WordList {
    /// A list of all characters that occur in any (normalized) word. `GlyphId`s used everywhere
    /// else are indices into this list.
    pub glyphs: SmallVec<[char; crate::MAX_GLYPH_COUNT]>,

    /// The inverse of `glyphs`: a map from a character to the `GlyphId` representing it.
    pub glyph_id_by_char: HashMap<char, GlyphId>,

    /// All loaded words, indexed by `WordId`.
    pub words: Vec<Word>,

    /// A map from a normalized string to the id of the Word representing it.
    pub word_id_by_string: HashMap<String, WordId>,

    /// The state of each source after loading, keyed by source id.
    pub source_states: HashMap<String, WordListSourceState>,
}

impl WordList {
    /// Construct a new `WordList` using the given sources (omitting any entries that are longer than
    /// `max_length`). Entries that normalize to a word we've already seen are dropped.
    #[must_use]
    pub fn new(source_configs: &[WordListSourceConfig], max_length: Option<usize>) -> WordList {
        let mut instance = WordList {
            glyphs: SmallVec::new(),
            glyph_id_by_char: HashMap::new(),
            words: vec![],
            word_id_by_string: HashMap::new(),
            source_states: HashMap::new(),
        };

        let mut seen_words: HashSet<String> = HashSet::new();

        for source in source_configs {
            let (entries, source_state) = load_words_from_source(source);

            for entry in entries {
                if max_length.is_some_and(|max_length| entry.normalized.chars().count() > max_length)
                {
                    continue;
                }
                if !seen_words.insert(entry.normalized.clone()) {
                    continue;
                }
                instance.add_word(entry);
            }

            instance
                .source_states
                .insert(source_state.id.clone(), source_state);
        }

        instance
    }

    /// Build a `WordList` from a single in-memory source.
    #[must_use]
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> WordList {
        WordList::new(
            &[WordListSourceConfig::Memory {
                id: "0".into(),
                words: words.iter().map(|word| word.as_ref().to_string()).collect(),
            }],
            None,
        )
    }

    fn add_word(&mut self, raw_entry: RawWordListEntry) -> WordId {
        let glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]> = raw_entry
            .normalized
            .chars()
            .map(|c| self.glyph_id_for_char(c))
            .collect();

        let word_id = self.words.len();
        self.word_id_by_string
            .insert(raw_entry.normalized.clone(), word_id);

        self.words.push(Word {
            normalized_string: raw_entry.normalized,
            canonical_string: raw_entry.canonical,
            glyphs,
        });

        word_id
    }

    /// What's the unique glyph id for the given char? We assign these lazily, in order of first
    /// appearance, since entries may contain digits or non-English letters.
    pub fn glyph_id_for_char(&mut self, ch: char) -> GlyphId {
        self.glyph_id_by_char.get(&ch).copied().unwrap_or_else(|| {
            self.glyphs.push(ch);
            let id = self.glyphs.len() - 1;
            self.glyph_id_by_char.insert(ch, id);
            id
        })
    }

    /// The number of distinct words in the vocabulary.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Borrow an existing word using its id.
    #[must_use]
    pub fn get_word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// Look up a word by its (not necessarily normalized) spelling.
    #[must_use]
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_id_by_string.get(&normalize_word(word)).copied()
    }

    /// For each source, return any errors it emitted while loading.
    #[must_use]
    pub fn get_source_errors(&self) -> HashMap<String, Vec<WordListError>> {
        self.source_states
            .iter()
            .map(|(source_id, source_state)| (source_id.clone(), source_state.errors.clone()))
            .collect()
    }
}

impl Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field("words", &self.words.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub mod tests {
    use crate::word_list::{WordList, WordListError, WordListSourceConfig};
    use std::path;
    use std::path::PathBuf;

    /// Locate a fixture file in the crate's `resources` directory.
    #[must_use]
    pub fn resource_path(file_name: &str) -> PathBuf {
        let mut path = path::PathBuf::from(file!());
        path.pop();
        path.pop();
        path.push("resources");
        path.push(file_name);
        path
    }

    #[test]
    fn test_loads_words_from_file() {
        let word_list = WordList::new(
            &[WordListSourceConfig::File {
                id: "0".into(),
                path: resource_path("words0.txt").into(),
            }],
            None,
        );

        assert!(word_list.get_source_errors()["0"].is_empty());
        assert_eq!(word_list.len(), 10);

        let word_id = word_list.word_id("seven").expect("vocabulary should include 'seven'");
        let word = word_list.get_word(word_id);
        assert_eq!(word.normalized_string, "SEVEN");
        assert_eq!(word.len(), 5);
        assert_eq!(word.canonical_string, "seven");
    }

    #[test]
    fn test_normalizes_and_dedupes() {
        let word_list = WordList::from_words(&["cat", " Cat ", "ice cream", "CAT", "dog"]);

        assert_eq!(
            word_list
                .words
                .iter()
                .map(|word| word.normalized_string.as_str())
                .collect::<Vec<_>>(),
            vec!["CAT", "ICECREAM", "DOG"]
        );
        assert_eq!(word_list.word_id("cat"), Some(0));
        assert_eq!(word_list.word_id("dog"), Some(2));
    }

    #[test]
    fn test_skips_words_over_max_length() {
        let word_list = WordList::new(
            &[WordListSourceConfig::Memory {
                id: "0".into(),
                words: vec!["ox".into(), "cat".into(), "horse".into()],
            }],
            Some(3),
        );

        assert_eq!(word_list.len(), 2);
        assert!(word_list.word_id("horse").is_none());
    }

    #[test]
    fn test_collects_source_errors() {
        let word_list = WordList::new(
            &[
                WordListSourceConfig::FileContents {
                    id: "contents".into(),
                    contents: "apple\n\nrock'n'roll\npear\n",
                },
                WordListSourceConfig::File {
                    id: "missing".into(),
                    path: resource_path("no_such_file.txt").into(),
                },
            ],
            None,
        );

        let errors = word_list.get_source_errors();
        assert_eq!(
            errors["contents"],
            vec![WordListError::InvalidWord("rock'n'roll".into())]
        );
        assert!(matches!(
            errors["missing"].as_slice(),
            [WordListError::InvalidPath(_)]
        ));
        assert_eq!(word_list.len(), 2);
    }

    #[test]
    #[allow(clippy::unicode_not_nfc)]
    fn test_unusual_characters() {
        let word_list = WordList::from_words(&[
            // Non-English character expressed as one `char`
            "monsutâ",
            // Non-English character expressed as two chars w/ combining form
            "hélen",
        ]);

        assert_eq!(
            word_list.words.iter().map(|word| word.len()).collect::<Vec<_>>(),
            vec![7, 5]
        );
    }
}
