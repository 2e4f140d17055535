use crate::clients::{MetabaseClient, Segment, TableInfo};
use crate::utils::{FileSerializer, FileUtils, JsonSerializer};
use crate::Result;
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tables of one BI database that carry segments, with those segments keyed by description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Every table of the database, including those without segments.
    pub table_ids: Vec<i64>,
    pub tables: IndexMap<i64, TableMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub table_info: TableInfo,
    pub segments: IndexMap<String, Segment>,
}

impl DatabaseMetadata {
    pub fn segment_count(&self) -> usize {
        self.tables.values().map(|table| table.segments.len()).sum()
    }
}

/// Group `segments` under the tables of `database_id`, dropping tables without segments.
pub fn build_database_metadata(
    tables: &[TableInfo],
    segments: &[Segment],
    database_id: i64,
) -> DatabaseMetadata {
    let mut metadata = DatabaseMetadata::default();

    for table in tables.iter().filter(|table| table.db_id == database_id) {
        metadata.table_ids.push(table.id);
        metadata.tables.insert(
            table.id,
            TableMetadata {
                table_info: table.clone(),
                segments: IndexMap::new(),
            },
        );
    }

    for segment in segments {
        if let Some(table) = metadata.tables.get_mut(&segment.table_id) {
            let key = segment.description.clone().unwrap_or_default();
            table.segments.insert(key, segment.clone());
        }
    }

    metadata.tables.retain(|_, table| !table.segments.is_empty());
    metadata
}

/// Table listing, read from `cache` when present, otherwise fetched and cached.
pub async fn cached_tables(client: &MetabaseClient, cache: &Path) -> Result<Vec<TableInfo>> {
    if cache.exists() {
        tracing::debug!(cache = %cache.display(), "using cached table listing");
        return FileUtils.load_from_file(cache, &JsonSerializer);
    }

    let tables = client
        .tables()
        .await
        .with_context(|| format!("failed to list tables on {}", client.base_url()))?;
    FileUtils.save_to_file(cache, &tables, &JsonSerializer)?;
    Ok(tables)
}
