//! Alias management commands
//!
//! An alias names an S3-compatible endpoint and its credentials so that
//! `ssd run --alias <name>` can target something other than AWS.

use clap::Subcommand;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use ssd_core::{Alias, AliasManager, BucketLookup};

#[derive(Subcommand, Debug)]
pub enum AliasCommands {
    /// Save an endpoint under a name
    Set(SetArgs),

    /// Show saved aliases, without credentials
    List,

    /// Forget a saved alias
    Remove {
        /// Name of the alias to remove
        name: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Alias name (e.g., "local", "minio")
    pub name: String,

    /// S3 endpoint URL (e.g., "http://localhost:9000")
    pub endpoint: String,

    pub access_key: String,

    pub secret_key: String,

    /// Region used for signing and bucket placement
    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// Bucket lookup style: auto, path, or dns
    #[arg(long, default_value = "auto")]
    pub bucket_lookup: BucketLookup,

    /// Overwrite an alias that already exists
    #[arg(long)]
    pub force: bool,
}

/// One alias as shown by `alias list`
#[derive(Serialize)]
struct AliasEntry<'a> {
    name: &'a str,
    endpoint: &'a str,
    region: &'a str,
    bucket_lookup: BucketLookup,
}

impl<'a> From<&'a Alias> for AliasEntry<'a> {
    fn from(alias: &'a Alias) -> Self {
        Self {
            name: &alias.name,
            endpoint: &alias.endpoint,
            region: &alias.region,
            bucket_lookup: alias.bucket_lookup,
        }
    }
}

#[derive(Serialize)]
struct AliasChange<'a> {
    alias: &'a str,
    action: &'static str,
}

/// Execute an alias subcommand
pub async fn execute(cmd: AliasCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match AliasManager::new() {
        Ok(am) => am,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    match cmd {
        AliasCommands::Set(args) => execute_set(args, &manager, &formatter),
        AliasCommands::List => execute_list(&manager, &formatter),
        AliasCommands::Remove { name } => execute_remove(&name, &manager, &formatter),
    }
}

fn report_change(formatter: &Formatter, alias: &str, action: &'static str) {
    if formatter.is_json() {
        formatter.json(&AliasChange { alias, action });
    } else {
        formatter.success(&format!("Alias '{alias}' {action}"));
    }
}

fn execute_set(args: SetArgs, manager: &AliasManager, formatter: &Formatter) -> ExitCode {
    let mut alias = Alias::new(
        &args.name,
        &args.endpoint,
        &args.access_key,
        &args.secret_key,
    );
    alias.region = args.region;
    alias.bucket_lookup = args.bucket_lookup;

    match manager.save(alias, args.force) {
        Ok(()) => {
            report_change(formatter, &args.name, "saved");
            ExitCode::Success
        }
        Err(e @ ssd_core::Error::AliasExists(_)) => {
            formatter.error(&format!("{e}; pass --force to overwrite it"));
            ExitCode::from(&e)
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

fn execute_list(manager: &AliasManager, formatter: &Formatter) -> ExitCode {
    let aliases = match manager.list() {
        Ok(aliases) => aliases,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    if formatter.is_json() {
        let entries: Vec<AliasEntry<'_>> = aliases.iter().map(AliasEntry::from).collect();
        formatter.json(&serde_json::json!({ "aliases": entries }));
    } else if aliases.is_empty() {
        formatter.println("No aliases configured.");
    } else {
        for alias in &aliases {
            formatter.println(&format!(
                "{:<12} {} [{}, {}]",
                alias.name, alias.endpoint, alias.region, alias.bucket_lookup
            ));
        }
    }
    ExitCode::Success
}

fn execute_remove(name: &str, manager: &AliasManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(name) {
        Ok(()) => {
            report_change(formatter, name, "removed");
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}
