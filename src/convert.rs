//! Shapefile -> GeoJSON conversion via the external `ogr2ogr` tool (GDAL).

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::info;

/// Convert the TIGER/Line shapefile to a GeoJSON reprojected to EPSG:4326.
///
/// No-ops when the output already exists, which makes re-runs cheap. The flip
/// side: a stale or truncated GeoJSON is never regenerated automatically —
/// delete the file to force a fresh conversion.
pub async fn convert_shapefile(shapefile: &Path, geojson: &Path) -> Result<()> {
    if geojson.exists() {
        info!(path = %geojson.display(), "GeoJSON already exists, skipping conversion");
        return Ok(());
    }

    if !shapefile.exists() {
        bail!(
            "shapefile not found: {} (expected location: {})",
            shapefile.display(),
            shapefile
                .canonicalize()
                .unwrap_or_else(|_| shapefile.to_path_buf())
                .display()
        );
    }

    println!("converting shapefile to GeoJSON...");
    println!("   input:  {}", shapefile.display());
    println!("   output: {}", geojson.display());
    println!("   this may take 30-60 seconds...");

    let status = Command::new("ogr2ogr")
        .arg("-f")
        .arg("GeoJSON")
        .arg("-t_srs")
        .arg("EPSG:4326")
        .arg(geojson)
        .arg(shapefile)
        .status()
        .await;

    match status {
        Ok(s) if s.success() => {
            info!("GeoJSON conversion complete");
            Ok(())
        }
        Ok(s) => bail!("ogr2ogr failed with {s}; make sure GDAL is installed (brew install gdal / apt install gdal-bin)"),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            bail!("ogr2ogr not found; install GDAL (brew install gdal / apt install gdal-bin)")
        }
        Err(e) => Err(e).context("failed to spawn ogr2ogr"),
    }
}
