//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

/// Remote control for a BCI2000 operator
#[derive(Parser, Debug)]
#[command(name = "bciremote")]
#[command(about = "Drive a BCI2000 operator over its telnet interface")]
#[command(version)]
pub struct Cli {
    /// Session file (defaults to <config dir>/bciremote/session.toml)
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,

    /// Log at debug level, including every command and response
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Directory for bciremote.log
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Connect, apply the session, set config and optionally start a run
    Run {
        /// Start a run even if the session does not ask for it
        #[arg(long)]
        start: bool,
    },
    /// Print the operator's system state
    State,
    /// Send one raw command and print the response
    Exec {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Ask the operator to quit
    Quit,
}

impl Cli {
    /// Log level override, if any.
    pub fn level(&self) -> Option<LevelFilter> {
        self.verbose.then_some(LevelFilter::Debug)
    }
}
