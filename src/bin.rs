use clap::Parser;
use log::info;
use std::fmt::{Debug, Formatter};
use std::fs;
use xword_csp::backtracking_search::{find_fill, FillOptions};
use xword_csp::grid_config::{render_entries, render_grid, PuzzleStructure};
use xword_csp::word_list::{WordList, WordListSourceConfig};

/// xword-csp: Fill a crossword grid from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the grid file, as ASCII with # representing blocks and _ or . representing empty
    /// squares
    structure_path: String,

    /// Path to the word list, one word per line
    words_path: String,

    /// Path to write the filled grid to
    output_path: Option<String>,

    /// Re-establish arc consistency after every choice made during the search
    #[arg(long)]
    maintain_arc_consistency: bool,

    /// Also print the numbered entries of the fill
    #[arg(long)]
    clues: bool,
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();

    let template = fs::read_to_string(&args.structure_path)
        .map_err(|_| Error(format!("Couldn't read file '{}'", args.structure_path)))?;

    let structure = PuzzleStructure::from_template(&template)
        .map_err(|error| Error(format!("Invalid grid: {error}")))?;

    let word_list = WordList::new(
        &[WordListSourceConfig::File {
            id: "0".into(),
            path: args.words_path.clone().into(),
        }],
        Some(structure.width.max(structure.height)),
    );

    if let Some(errors) = word_list.get_source_errors().get("0") {
        match errors.as_slice() {
            [] => {}
            [error] => return Err(Error(format!("{error}"))),
            errors => {
                let mut full_error = String::new();
                for error in errors {
                    full_error.push_str(&format!("\n- {error}"));
                }
                return Err(Error(full_error));
            }
        }
    }

    if word_list.is_empty() {
        return Err(Error("Word list is empty".into()));
    }

    info!(
        "loaded {} slots and {} words",
        structure.slot_count(),
        word_list.len()
    );

    let options = FillOptions {
        maintain_arc_consistency: args.maintain_arc_consistency,
    };

    let result = match find_fill(&structure, &word_list, options) {
        Ok(result) => result,
        Err(failure) => {
            info!("{failure}");
            println!("No solution.");
            return Err(Error("Unfillable grid".into()));
        }
    };

    info!("{:?}", result.statistics);

    let rendered = render_grid(&structure, &word_list, &result.choices);
    println!("{rendered}");

    if args.clues {
        println!();
        for entry in render_entries(&structure, &word_list, &result.choices) {
            println!("{entry}");
        }
    }

    if let Some(output_path) = &args.output_path {
        fs::write(output_path, format!("{rendered}\n"))
            .map_err(|_| Error(format!("Couldn't write file '{output_path}'")))?;
    }

    Ok(())
}
