//! Runtime configuration for the ZCTA import job.
//!
//! Everything that the job touches — file paths, the database DSN, batch
//! sizing — is env-supplied with defaults matching the TIGER/Line 2025
//! release layout, so a plain `import_zcta` run in the data directory works
//! without flags.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::util::env as env_util;

/// Default batch size for chunked uploads (one commit per chunk).
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Sample ZIP used by the post-upload verification query.
pub const DEFAULT_SAMPLE_ZIP: &str = "60654";

#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// TIGER/Line shapefile (.shp) to convert.
    pub shapefile: PathBuf,
    /// GeoJSON output of the conversion; also the upload input.
    pub geojson: PathBuf,
    /// Postgres DSN, resolved from SUPABASE_DB_URL / DATABASE_URL / DB_* vars.
    pub database_url: String,
    pub batch_size: usize,
    pub sample_zip: String,
    pub max_connections: u32,
}

impl ImportConfig {
    pub fn from_env() -> Result<Self> {
        env_util::init_env();
        let shapefile = env_util::env_opt("ZCTA_SHAPEFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                PathBuf::from("./tl_2025_us_zcta520").join("tl_2025_us_zcta520.shp")
            });
        let geojson = env_util::env_opt("ZCTA_GEOJSON")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./us_zips.geojson"));
        let database_url = env_util::db_url().context(
            "no database URL configured; set SUPABASE_DB_URL or DATABASE_URL (or DB_HOST/DB_USER/DB_PASSWORD)",
        )?;
        let batch_size = env_util::env_parse("ZCTA_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1);
        let sample_zip = env_util::env_opt("ZCTA_SAMPLE_ZIP")
            .unwrap_or_else(|| DEFAULT_SAMPLE_ZIP.to_string());
        let max_connections = env_util::env_parse("DB_MAX_CONNECTIONS", 5u32);

        Ok(Self {
            shapefile,
            geojson,
            database_url,
            batch_size,
            sample_zip,
            max_connections,
        })
    }
}
