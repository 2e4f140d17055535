pub mod args;
pub mod commands;

pub use args::{DatabaseMetadataArgs, EnvironmentArgs, ImportCollectionArgs};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "bisync")]
#[command(version = crate::VERSION)]
#[command(about = "Sync BI inventory and migrate BI collections between instances")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: load-applications, test-export, remove-segments, then import-collection.\nSettings come from ./bisync.toml and environment variables."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    #[command(
        about = "Refresh the application inventory",
        long_about = "Load-applications lists applications from the cloud admin service and records each one's BI config and app user in applications-<environment>.json. Steps already recorded are skipped.",
        after_help = "Example:\n    bisync load-applications -e production"
    )]
    LoadApplications(EnvironmentArgs),
    #[command(
        about = "Export every application's BI collection once",
        long_about = "Test-export exports the collection of each inventory entry that has no export status yet and records succeeded or failed.",
        after_help = "Example:\n    bisync test-export -e testing"
    )]
    TestExport(EnvironmentArgs),
    #[command(
        about = "Import the exported collection into the import instance",
        long_about = "Import-collection uploads ./export.tar.gz to the import BI instance as the configured import app user.",
        after_help = "Example:\n    bisync import-collection --app-id acme --collection-id 291 --group-id 62 --database-id 60"
    )]
    ImportCollection(ImportCollectionArgs),
    #[command(
        about = "Strip segment filters from an export archive",
        long_about = "Remove-segments unpacks ./export.tar.gz, deletes segment filter clauses from every collection YAML file and writes ./export-without-segments.tar.gz.",
        after_help = "Example:\n    bisync remove-segments"
    )]
    RemoveSegments,
    #[command(
        about = "Print the segments defined on a database",
        long_about = "Database-metadata lists the tables of one BI database together with their segments, keyed by segment description, as JSON.",
        after_help = "Example:\n    bisync database-metadata -e testing --database-id 60"
    )]
    DatabaseMetadata(DatabaseMetadataArgs),
}

impl Command {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Command::LoadApplications(_) => "load-applications",
            Command::TestExport(_) => "test-export",
            Command::ImportCollection(_) => "import-collection",
            Command::RemoveSegments => "remove-segments",
            Command::DatabaseMetadata(_) => "database-metadata",
        }
    }
}

pub async fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::LoadApplications(env_args) => commands::load_applications(env_args).await,
        Command::TestExport(env_args) => commands::test_export(env_args).await,
        Command::ImportCollection(import_args) => commands::import_collection(import_args).await,
        Command::RemoveSegments => commands::remove_segments().await,
        Command::DatabaseMetadata(metadata_args) => {
            commands::database_metadata(metadata_args).await
        }
    }
}
