//! Command-line interface: clap-derived arguments with `FUZZY_MERGE_*` env fallbacks.

mod clap_parser;

pub use clap_parser::{Cli, Command, MatchArgs};
