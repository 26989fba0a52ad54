use clap::{Parser, Subcommand};

mod args;
mod parsers;


pub use args::{CompareArgs, OutputFormat, RunArgs, ValidateArgs};
#[cfg(test)]
pub(crate) use args::GateArgs;
pub(crate) use parsers::{parse_comment_mode, parse_pr_number};

#[derive(Debug, Parser)]
#[command(name = "evalgate")]
#[command(about = "Gate CI on evaluation reports and baseline regressions", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the evaluation command, gate its report and publish the summary.
    Run(Box<RunArgs>),
    /// Validate a report file and print it normalized.
    Validate(ValidateArgs),
    /// Diff and gate two local report files.
    Compare(CompareArgs),
}

impl Commands {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::Validate(_) => "validate",
            Self::Compare(_) => "compare",
        }
    }
}
