//! Configuration of the legalization run.
//!

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use crate::legalizer::tetris::TetrisLegalizer;

/// Configuration variables related to input/output operations
#[derive(Clone, Debug)]
pub struct IOConfig {
    /// Input file name (a JSON design database)
    pub input_file: PathBuf,
    /// Output file name (JSON legalized positions)
    pub output_file: PathBuf,
}

/// Configuration of the tetris legalizer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LegalizerConfig {
    /// Maximum number of rows a cell may be moved away from its closest row. Unbounded (i.e.
    /// limited only by the number of rows) if `None`.
    pub max_stride: Option<usize>,
    /// Fail the run instead of writing the unplaced sentinel when some cells find no site
    pub fail_on_unplaced: bool,
    /// Re-check the result for overlaps and misalignment before writing it out
    pub verify: bool,
}

impl LegalizerConfig {
    pub fn build(&self) -> TetrisLegalizer {
        TetrisLegalizer::new(self.max_stride, self.fail_on_unplaced)
    }
}

/// Overall configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub io: IOConfig,
    pub legalizer: LegalizerConfig,
}

impl Config {
    /// Construct a configuration from the clap argument matches
    pub fn from_args(matches: &clap::ArgMatches) -> Result<Self> {
        let path = |name: &str| {
            matches
                .value_of_os(name)
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("Missing required argument {}", name))
        };

        Ok(Config {
            io: IOConfig {
                input_file: path("INPUT")?,
                output_file: path("OUTPUT")?,
            },
            legalizer: LegalizerConfig {
                max_stride: matches
                    .value_of("MAX_STRIDE")
                    .map(|s| s.parse::<usize>())
                    .transpose()
                    .context("Parse MAX_STRIDE")?,
                fail_on_unplaced: matches.is_present("STRICT"),
                verify: matches.is_present("VERIFY"),
            },
        })
    }
}
