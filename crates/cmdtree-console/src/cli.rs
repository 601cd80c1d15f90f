//! Command line arguments of the `cmdtree` binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::output::OutputMode;

#[derive(Parser, Debug)]
#[command(name = "cmdtree", version, about = "Interactive command console", long_about = None)]
pub struct Cli {
    /// YAML command file to load instead of the built-in commands
    #[arg(short, long, value_name = "FILE")]
    pub commands: Option<PathBuf>,

    /// How command results are printed
    #[arg(short, long, value_enum, default_value_t = OutputMode::Text)]
    pub output: OutputMode,

    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,

    /// Print the completions of LINE and exit
    #[arg(long, value_name = "LINE", conflicts_with = "execute")]
    pub complete: Option<String>,

    /// Execute LINE and exit; may be repeated
    #[arg(short, long, value_name = "LINE")]
    pub execute: Vec<String>,

    /// Print the usage of every command and exit
    #[arg(long)]
    pub list: bool,
}
