use crate::{
    cli::args::{DatabaseMetadataArgs, EnvironmentArgs, ImportCollectionArgs},
    core::{
        inventory::BiConfig,
        sync::{self, ImportTarget},
        BisyncConfig, ConfigLoader, ConfigValidator,
    },
    segments,
    Result,
};
use serde_json::Map;
use std::env;

fn load_config() -> Result<BisyncConfig> {
    let workspace_path = env::current_dir()?;
    let config = ConfigLoader::load_from_workspace(&workspace_path)?;
    ConfigValidator::validate(&config)?;
    Ok(config)
}

pub async fn load_applications(args: EnvironmentArgs) -> Result<()> {
    tracing::info!("Loading applications for {}", args.environment);
    let config = load_config()?;

    let inventory = sync::load_applications(&config, args.environment).await?;
    let ready = inventory
        .iter()
        .filter(|(_, record)| record.bi_config().is_some() && record.app_user().is_some())
        .count();

    println!("Applications: {}", inventory.len());
    println!("Ready for export: {}", ready);
    println!("Inventory: {}", inventory.path().display());
    Ok(())
}

pub async fn test_export(args: EnvironmentArgs) -> Result<()> {
    tracing::info!("Exporting collections for {}", args.environment);
    let config = load_config()?;

    let summary = sync::test_export(&config, args.environment).await?;
    println!("Succeeded: {}", summary.succeeded);
    println!("Failed: {}", summary.failed);
    println!("Skipped: {}", summary.skipped);
    Ok(())
}

pub async fn import_collection(args: ImportCollectionArgs) -> Result<()> {
    tracing::info!("Importing collection for {}", args.app_id);
    let config = load_config()?;

    let target = ImportTarget {
        app_id: args.app_id,
        bi_config: BiConfig {
            collection_id: args.collection_id,
            group_id: args.group_id,
            database_id: args.database_id,
            unique_identifier: None,
            group_name: None,
            is_initialized: None,
            rest: Map::new(),
        },
    };
    sync::import_collection(&config, &target).await?;
    println!("Imported {}", config.files.export_archive.display());
    Ok(())
}

pub async fn remove_segments() -> Result<()> {
    let config = load_config()?;
    let input = config.files.export_archive.clone();
    let output = config.files.stripped_archive.clone();
    tracing::info!("Removing segment filters from {}", input.display());

    let report =
        tokio::task::spawn_blocking(move || segments::remove_segments_in_archive(&input, &output))
            .await??;

    println!("YAML files: {}", report.tree.files_visited.len());
    println!("Files changed: {}", report.tree.files_changed);
    println!("Filters removed: {}", report.tree.blocks_removed);
    println!("Written: {}", report.output.display());
    Ok(())
}

pub async fn database_metadata(args: DatabaseMetadataArgs) -> Result<()> {
    tracing::info!(
        "Collecting metadata for database {} on {}",
        args.database_id,
        args.environment
    );
    let config = load_config()?;

    let metadata = sync::database_metadata(&config, args.environment, args.database_id).await?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
