//! CLI command definitions and execution

use clap::{Parser, Subcommand};

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

pub mod alias;
pub mod run;

/// ssd - storage session demo
///
/// Walks a bucket and object through their whole lifecycle on an
/// S3-compatible service: create, list, grant public read, upload,
/// download, list, delete.
#[derive(Parser, Debug)]
#[command(name = "ssd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the storage session once
    Run(run::RunArgs),

    /// Manage storage service aliases
    #[command(subcommand)]
    Alias(alias::AliasCommands),
}

impl Cli {
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            json: self.json,
            no_color: self.no_color,
            quiet: self.quiet,
        }
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = cli.output_config();

    match cli.command {
        Commands::Run(args) => run::execute(args, output_config).await,
        Commands::Alias(cmd) => alias::execute(cmd, output_config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "ssd",
            "run",
            "--offline",
            "--bucket-prefix",
            "team-demo",
            "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.offline);
                assert_eq!(args.bucket_prefix.as_deref(), Some("team-demo"));
                assert!(args.alias.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_offline_conflicts_with_alias() {
        let result = Cli::try_parse_from(["ssd", "run", "--offline", "--alias", "local"]);
        assert!(result.is_err());
    }
}
