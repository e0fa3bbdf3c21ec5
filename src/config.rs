//! Runtime options of the `exact-rref` binary.
//!
//! Every flag has an environment fallback, so `EXACT_RREF_EQUATIONS=true`
//! is the same as passing `--equations`.

use std::path::PathBuf;

use clap::Parser;

use crate::printer::PrintOptions;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "exact-rref")]
#[command(about = "Solve linear systems over the rationals by exact row reduction")]
#[command(version = env!("EXACT_RREF_VERSION"))]
pub struct Cli {
    /// Read the system from this file instead of standard input
    pub input: Option<PathBuf>,

    /// Read named linear equations instead of an augmented matrix
    #[arg(long, env = "EXACT_RREF_EQUATIONS")]
    pub equations: bool,

    /// Prefix of the generated variable names
    #[arg(long, env = "EXACT_RREF_VARIABLE_PREFIX", default_value = "x")]
    pub variable_prefix: String,

    /// Prefix of the free parameters
    #[arg(long, env = "EXACT_RREF_PARAMETER_PREFIX", default_value = "t")]
    pub parameter_prefix: String,

    /// Column separator of the printed matrix; `\t` is a tab
    #[arg(long, env = "EXACT_RREF_SEPARATOR", default_value = "\t")]
    pub separator: String,

    /// Log filter, e.g. `debug` or `exact_rref=trace`
    #[arg(long, env = "EXACT_RREF_LOG", default_value = "warn")]
    pub log: String,

    /// Only print the solution, not the reduced matrix
    #[arg(long)]
    pub quiet_matrix: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Matrix,
    Equations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `None` reads standard input.
    pub input: Option<PathBuf>,
    pub mode: InputMode,
    pub print: PrintOptions,
    pub log_filter: String,
}

impl Config {
    /// Parse the process arguments and environment.
    pub fn from_env() -> Config {
        Cli::parse().into()
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            input: cli.input.filter(|p| p.as_os_str() != "-"),
            mode: if cli.equations {
                InputMode::Equations
            } else {
                InputMode::Matrix
            },
            print: PrintOptions {
                variable_prefix: cli.variable_prefix.into(),
                parameter_prefix: cli.parameter_prefix.into(),
                column_separator: cli.separator.replace("\\t", "\t").into(),
                print_matrix: !cli.quiet_matrix,
            },
            log_filter: cli.log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Config {
        Cli::try_parse_from(std::iter::once("exact-rref").chain(args.iter().copied()))
            .unwrap()
            .into()
    }

    #[test]
    fn defaults() {
        let c = config(&[]);
        assert_eq!(c.input, None);
        assert_eq!(c.mode, InputMode::Matrix);
        assert_eq!(c.print, PrintOptions::default());
        assert_eq!(c.log_filter, "warn");
    }

    #[test]
    fn flags() {
        let c = config(&[
            "--equations",
            "--variable-prefix",
            "y",
            "--parameter-prefix",
            "s",
            "--separator",
            "\\t|",
            "--log",
            "exact_rref=debug",
            "--quiet-matrix",
            "system.txt",
        ]);

        assert_eq!(c.input, Some(PathBuf::from("system.txt")));
        assert_eq!(c.mode, InputMode::Equations);
        assert_eq!(c.print.variable_prefix.as_str(), "y");
        assert_eq!(c.print.parameter_prefix.as_str(), "s");
        assert_eq!(c.print.column_separator.as_str(), "\t|");
        assert!(!c.print.print_matrix);
        assert_eq!(c.log_filter, "exact_rref=debug");
    }

    #[test]
    fn dash_is_stdin() {
        assert_eq!(config(&["-"]).input, None);
    }

    #[test]
    fn unknown_flag() {
        assert!(Cli::try_parse_from(["exact-rref", "--pivot", "max"]).is_err());
    }
}
