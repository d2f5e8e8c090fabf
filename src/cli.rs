use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::STORAGE_NG_VERSION;

#[derive(Parser, Debug)]
#[clap(version = STORAGE_NG_VERSION)]
pub struct Cli {
    /// Logging verbosity [OFF, ERROR, WARN, INFO, DEBUG, TRACE]
    #[arg(global = true, short, long, default_value_t = LevelFilter::Info)]
    pub verbosity: LevelFilter,

    /// Also write all log records as JSON lines to this file
    #[arg(global = true, long)]
    pub log_file: Option<PathBuf>,

    /// Emit tracing events as JSON on stderr
    #[arg(global = true, long)]
    pub trace: bool,

    /// Write a YAML report of the error to this file if the command fails
    #[arg(global = true, long)]
    pub error: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a devicegraph from a layout file and print it
    Show {
        /// Path to a layout file
        #[clap(index = 1)]
        layout: PathBuf,

        /// Path to an environment configuration file
        #[clap(short, long)]
        environment: Option<PathBuf>,
    },

    /// Build a devicegraph from a layout file and report consistency issues
    ///
    /// Exits with a non-zero status when issues are found.
    Check {
        /// Path to a layout file
        #[clap(index = 1)]
        layout: PathBuf,

        /// Path to an environment configuration file
        #[clap(short, long)]
        environment: Option<PathBuf>,
    },

    /// Print the effective environment configuration
    Environment {
        /// Path to an environment configuration file
        #[clap(short, long)]
        environment: Option<PathBuf>,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Show { .. } => "show",
            Commands::Check { .. } => "check",
            Commands::Environment { .. } => "environment",
        }
    }
}

impl Display for Commands {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_parse() {
        let cli = Cli::try_parse_from([
            "storage-ng",
            "check",
            "layout.yaml",
            "--verbosity",
            "trace",
            "--log-file",
            "/tmp/storage-ng.log",
            "--error",
            "/tmp/error.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, LevelFilter::Trace);
        assert_eq!(cli.log_file.as_deref(), Some(Path::new("/tmp/storage-ng.log")));
        assert!(!cli.trace);
        assert_eq!(cli.error.as_deref(), Some(Path::new("/tmp/error.yaml")));
        match cli.command {
            Commands::Check {
                ref layout,
                ref environment,
            } => {
                assert_eq!(layout, Path::new("layout.yaml"));
                assert_eq!(environment, &None);
            }
            _ => panic!("unexpected command"),
        }
        assert_eq!(cli.command.to_string(), "check");
    }

    #[test]
    fn test_parse_environment() {
        let cli = Cli::try_parse_from(["storage-ng", "--trace", "environment", "-e", "env.yaml"])
            .unwrap();
        assert!(cli.trace);
        assert_eq!(cli.verbosity, LevelFilter::Info);
        assert_eq!(cli.command.name(), "environment");
        assert_eq!(cli.error, None);

        assert!(Cli::try_parse_from(["storage-ng", "show"]).is_err());
    }
}
