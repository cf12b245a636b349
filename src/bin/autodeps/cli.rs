//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use autodeps::ScoreStrategy;

/// autodeps - infer deps and external_deps of C/C++ libraries from their includes
#[derive(Parser)]
#[command(name = "autodeps")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Build description to edit (defaults to BUILD.toml in cwd or a parent)
    #[arg(long, global = true, value_name = "PATH")]
    pub build_file: Option<PathBuf>,

    /// Config file used in place of .autodeps/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to run; without one, the arguments below run `fix`.
    /// A subcommand name is only recognized before the first target.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments of the default `fix` command
    #[command(flatten)]
    pub fix: FixArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer dependencies and update the build description (default)
    Fix(FixArgs),

    /// Show how headers are classified against the current tree
    Classify(ClassifyArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for commands and classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per entry
    #[default]
    Text,
    /// A JSON array
    Json,
}

#[derive(Args, Default)]
pub struct FixArgs {
    /// Only process these libraries (defaults to all)
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Scoring function: edit_distance, list_size or best
    #[arg(long, value_name = "NAME")]
    pub score: Option<ScoreStrategy>,

    /// Print the commands instead of applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Output format of the command batch
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Header paths as written in include directives
    #[arg(required = true, value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_invocation_is_fix() {
        let cli = Cli::parse_from(["autodeps", "foo", "--dry-run", "--score", "list_size"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.fix.targets, vec!["foo"]);
        assert!(cli.fix.dry_run);
        assert_eq!(cli.fix.score, Some(ScoreStrategy::ListSize));
    }

    #[test]
    fn test_unknown_score_is_rejected() {
        let result = Cli::try_parse_from(["autodeps", "--score", "fastest"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_classify_subcommand() {
        let cli = Cli::parse_from(["autodeps", "-v", "classify", "zlib.h", "--format", "json"]);
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Classify(args)) => {
                assert_eq!(args.headers, vec!["zlib.h"]);
                assert_eq!(args.format, OutputFormat::Json);
            }
            _ => panic!("expected classify"),
        }
    }

    #[test]
    fn test_subcommand_after_global_options() {
        let cli = Cli::parse_from([
            "autodeps",
            "--no-color",
            "--build-file",
            "other/BUILD.toml",
            "fix",
            "--dry-run",
        ]);
        assert!(cli.no_color);
        assert_eq!(cli.build_file, Some(PathBuf::from("other/BUILD.toml")));
        match cli.command {
            Some(Commands::Fix(args)) => {
                assert!(args.dry_run);
                assert!(args.targets.is_empty());
            }
            _ => panic!("expected fix"),
        }
    }

    #[test]
    fn test_verbose_bare_invocation_keeps_targets() {
        let cli = Cli::parse_from(["autodeps", "-v", "foo", "bar"]);
        assert!(cli.verbose);
        assert!(cli.command.is_none());
        assert_eq!(cli.fix.targets, vec!["foo", "bar"]);
    }
}
