use crate::core::types::Environment;
use clap::Args;

#[derive(Args, Clone, Debug)]
pub struct EnvironmentArgs {
    /// Environment whose applications are processed
    #[arg(short, long, value_enum, default_value_t = Environment::Testing)]
    pub environment: Environment,
}

#[derive(Args, Clone, Debug)]
pub struct ImportCollectionArgs {
    /// Application identifier the collection belongs to
    #[arg(long, value_name = "APP_ID")]
    pub app_id: String,

    /// Collection id on the source instance
    #[arg(long, value_name = "ID")]
    pub collection_id: i64,

    /// Permission group id on the target instance
    #[arg(long, value_name = "ID")]
    pub group_id: i64,

    /// Database id on the target instance
    #[arg(long, value_name = "ID")]
    pub database_id: i64,
}

#[derive(Args, Clone, Debug)]
pub struct DatabaseMetadataArgs {
    /// Environment whose BI instance is queried
    #[arg(short, long, value_enum, default_value_t = Environment::Testing)]
    pub environment: Environment,

    /// Database to collect segments for
    #[arg(long, value_name = "ID")]
    pub database_id: i64,
}
