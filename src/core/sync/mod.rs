//! Inventory and collection workflows driven by the CLI.

use crate::clients::{
    AppUserClient, CloudAdminClient, ConsulClient, MetabaseClientFactory, SwarmApplication,
};
use crate::core::config::{BisyncConfig, Credentials};
use crate::core::inventory::{BiConfig, Inventory, Lookup, StoredBiConfig};
use crate::core::metadata::{build_database_metadata, cached_tables, DatabaseMetadata};
use crate::core::types::{Environment, ExportStatus};
use crate::Result;
use anyhow::{anyhow, Context};
use std::path::Path;

/// Tally of one bulk export run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Records that already had an export status.
    pub skipped: usize,
}

/// Application and BI placement a collection is imported for.
#[derive(Debug, Clone)]
pub struct ImportTarget {
    pub app_id: String,
    pub bi_config: BiConfig,
}

/// Refresh the inventory from the cloud admin service.
///
/// Steps already recorded for an application are not repeated.
pub async fn load_applications(config: &BisyncConfig, environment: Environment) -> Result<Inventory> {
    let mut inventory = Inventory::load(&config.inventory_path(environment))?;

    let cloud_admin = config.cloud_admin()?;
    let cloud_admin = CloudAdminClient::new(cloud_admin.api_key, cloud_admin.endpoint);
    let app_users = config.app_user_service(environment)?;
    let app_users = AppUserClient::new(app_users.endpoint, app_users.api_key);
    let consul = match environment {
        Environment::Testing => None,
        Environment::Production => {
            let settings = config.consul(environment)?;
            Some(ConsulClient::new(settings.cookie, &settings.server))
        }
    };

    let found = cloud_admin
        .docker_swarm_applications(environment)
        .await
        .context("failed to list docker swarm applications")?;
    tracing::info!(environment = %environment, count = found.len(), "found applications");

    for application in &found {
        let identifier = application.identifier.as_str();

        if inventory.entry(identifier).lime_bi_config.is_none() {
            let resolved = resolve_bi_config(application, consul.as_ref()).await?;
            match &resolved {
                Lookup::Missing => tracing::warn!(app_id = %identifier, "no BI config"),
                Lookup::Found(StoredBiConfig::Raw(_)) => {
                    tracing::warn!(app_id = %identifier, "BI config lacks placement ids")
                }
                Lookup::Found(StoredBiConfig::Parsed(_)) => {}
            }
            inventory.entry(identifier).lime_bi_config = Some(resolved);
        }

        if inventory.entry(identifier).app_user_username.is_none() {
            let user = match app_users.fetch(identifier).await {
                Ok(user) => Some(Credentials {
                    username: user.app_user_username,
                    password: user.app_user_password,
                }),
                Err(err) => {
                    tracing::warn!(app_id = %identifier, error = %err, "no app user");
                    None
                }
            };
            inventory.entry(identifier).set_app_user(user);
        }
    }

    inventory.save()?;
    tracing::info!(
        path = %inventory.path().display(),
        applications = inventory.len(),
        "saved inventory"
    );
    Ok(inventory)
}

async fn resolve_bi_config(
    application: &SwarmApplication,
    consul: Option<&ConsulClient>,
) -> Result<Lookup<StoredBiConfig>> {
    let raw = match consul {
        None => application.bi_config_value(),
        Some(consul) => consul
            .bi_config(&application.identifier)
            .await
            .with_context(|| format!("failed to read consul config of {}", application.identifier))?,
    };
    Ok(raw.map(StoredBiConfig::from_value).into())
}

/// Export the collection of every application that has not been tried yet.
///
/// A failing application is recorded as failed and the run continues. The
/// inventory is saved after each application.
pub async fn test_export(config: &BisyncConfig, environment: Environment) -> Result<ExportSummary> {
    let mut inventory = Inventory::load(&config.inventory_path(environment))?;
    let metabase = config.metabase(environment)?;
    let mut summary = ExportSummary::default();

    for app_id in inventory.identifiers() {
        let record = inventory.entry(&app_id).clone();
        if record.export_status.is_some() {
            summary.skipped += 1;
            continue;
        }

        let status = match (record.bi_config(), record.app_user()) {
            (Some(bi_config), Some(app_user)) => {
                tracing::info!(app_id = %app_id, "exporting collection");
                let factory = MetabaseClientFactory::new(&app_id, &metabase, Some(app_user));
                match export_collection(&factory, bi_config, &config.files.export_archive).await {
                    Ok(()) => ExportStatus::Succeeded,
                    Err(err) => {
                        let message = format!("{:#}", err);
                        tracing::error!(app_id = %app_id, error = %message, "export failed");
                        ExportStatus::Failed
                    }
                }
            }
            _ => {
                tracing::warn!(app_id = %app_id, "missing BI config or app user, not exporting");
                ExportStatus::Failed
            }
        };

        match status {
            ExportStatus::Succeeded => summary.succeeded += 1,
            ExportStatus::Failed => summary.failed += 1,
        }
        inventory.entry(&app_id).export_status = Some(status);
        inventory.save()?;
    }

    Ok(summary)
}

/// Export one application's collection to `dest` as its app user.
///
/// The admin login only verifies the instance credentials.
pub async fn export_collection(
    factory: &MetabaseClientFactory,
    bi_config: &BiConfig,
    dest: &Path,
) -> Result<()> {
    let admin = factory.create_admin_client().await?;
    let app_user = factory.create_app_user_client().await?;

    tracing::info!(
        metabase_url = %factory.metabase_url,
        admin_username = %admin.username(),
        app_user_username = %app_user.username(),
        collection_id = bi_config.collection_id,
        group_id = bi_config.group_id,
        database_id = bi_config.database_id,
        "exporting BI collection"
    );

    let bytes = app_user
        .export_collection(bi_config.collection_id, dest)
        .await
        .with_context(|| format!("failed to export collection {}", bi_config.collection_id))?;
    tracing::info!(dest = %dest.display(), bytes, "wrote export archive");
    Ok(())
}

/// Import the export archive into the import instance as the import app user.
pub async fn import_collection(config: &BisyncConfig, target: &ImportTarget) -> Result<()> {
    let archive = &config.files.export_archive;
    if !archive.exists() {
        return Err(anyhow!("export archive {} does not exist", archive.display()));
    }

    let metabase = config.metabase_import()?;
    let app_user = config.import_user()?;
    let factory = MetabaseClientFactory::new(&target.app_id, &metabase, Some(app_user));

    let admin = factory.create_admin_client().await?;
    let app_user = factory.create_app_user_client().await?;

    tracing::info!(
        app_id = %target.app_id,
        metabase_url = %factory.metabase_url,
        admin_username = %admin.username(),
        app_user_username = %app_user.username(),
        collection_id = target.bi_config.collection_id,
        group_id = target.bi_config.group_id,
        database_id = target.bi_config.database_id,
        "importing BI collections"
    );

    app_user
        .import_collection(archive)
        .await
        .with_context(|| format!("failed to import {}", archive.display()))?;
    tracing::info!(archive = %archive.display(), "import finished");
    Ok(())
}

/// Segments of one database on the environment's BI instance, grouped by table.
pub async fn database_metadata(
    config: &BisyncConfig,
    environment: Environment,
    database_id: i64,
) -> Result<DatabaseMetadata> {
    let metabase = config.metabase(environment)?;
    let factory = MetabaseClientFactory::new(environment.as_str(), &metabase, None);
    let client = factory.create_admin_client().await?;

    let tables = cached_tables(&client, &config.table_cache_path(environment)).await?;
    let segments = client
        .segments()
        .await
        .context("failed to list segments")?;

    let metadata = build_database_metadata(&tables, &segments, database_id);
    tracing::info!(
        database_id,
        tables = metadata.tables.len(),
        segments = metadata.segment_count(),
        "collected database metadata"
    );
    Ok(metadata)
}
