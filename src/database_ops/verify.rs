//! Post-upload smoke check: total count plus one sample lookup.

use anyhow::{Context, Result};
use sqlx::Row;
use tracing::{instrument, warn};

use crate::database_ops::db::Db;

/// Report the final row count and look up one known ZIP as a human-readable
/// signal that geometries landed intact. Absence of the sample row is only a
/// warning — coverage varies by TIGER vintage.
#[instrument(skip(db))]
pub async fn verify_upload(db: &Db, sample_zip: &str) -> Result<()> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gis.zip_boundaries")
        .persistent(false)
        .fetch_one(&db.pool)
        .await
        .context("failed to count uploaded ZIP boundaries")?;
    println!("total ZIP boundaries in database: {total}");

    let sample = sqlx::query(
        "SELECT zcta5ce20, ST_AsGeoJSON(geom::geometry)::jsonb->>'type' AS geom_type \
         FROM gis.zip_boundaries WHERE zcta5ce20 = $1 LIMIT 1",
    )
    .persistent(false)
    .bind(sample_zip)
    .fetch_optional(&db.pool)
    .await
    .context("sample lookup failed")?;

    match sample {
        Some(row) => {
            let zip: String = row.get("zcta5ce20");
            let geom_type: Option<String> = row.get("geom_type");
            println!(
                "test query successful: ZIP {zip} found (type: {})",
                geom_type.as_deref().unwrap_or("unknown")
            );
        }
        None => warn!(zip = sample_zip, "sample ZIP not found (may be normal)"),
    }
    Ok(())
}
