//! Resume filter and chunked upload of ZIP boundaries.

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::database_ops::db::Db;
use crate::geojson_src::ZipBoundary;

// GeoJSON -> geometry -> WKB -> geography; ST_GeogFromWKB is cheaper than
// going through ST_GeogFromText. The conflict clause makes the insert safe
// against a concurrent writer racing this job on the same key.
const INSERT_SQL: &str = "\
INSERT INTO gis.zip_boundaries (zcta5ce20, geom) \
VALUES ($1, ST_GeogFromWKB(ST_AsBinary(ST_SetSRID(ST_GeomFromGeoJSON($2::text), 4326)))) \
ON CONFLICT (zcta5ce20) DO NOTHING";

/// Load the full set of already-imported ZIP codes.
///
/// Held in memory; ~33k ZCTA5 codes nationwide, so this is a few MB at most.
#[instrument(skip(db))]
pub async fn existing_zip_codes(db: &Db) -> Result<HashSet<String>> {
    let existing_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gis.zip_boundaries")
        .persistent(false)
        .fetch_one(&db.pool)
        .await
        .context("failed to count existing ZIP boundaries")?;
    if existing_count == 0 {
        return Ok(HashSet::new());
    }
    println!("found {existing_count} existing ZIP boundaries");
    let codes: Vec<String> = sqlx::query_scalar("SELECT zcta5ce20 FROM gis.zip_boundaries")
        .persistent(false)
        .fetch_all(&db.pool)
        .await
        .context("failed to load existing ZIP codes")?;
    Ok(codes.into_iter().collect())
}

/// Split input records into (to-insert, skipped-count).
pub fn partition_new(
    records: Vec<ZipBoundary>,
    existing: &HashSet<String>,
) -> (Vec<ZipBoundary>, usize) {
    let total = records.len();
    let to_insert: Vec<ZipBoundary> = records
        .into_iter()
        .filter(|r| !existing.contains(&r.zip_code))
        .collect();
    let skipped = total - to_insert.len();
    (to_insert, skipped)
}

/// Insert the remaining records in fixed-size chunks, one commit per chunk.
///
/// A failing statement aborts the run: the open transaction rolls back on
/// drop, the error propagates, and chunks committed earlier stay persisted —
/// re-running the job skips them via the resume filter.
#[instrument(skip(db, records))]
pub async fn upload_boundaries(db: &Db, records: &[ZipBoundary], batch_size: usize) -> Result<usize> {
    if records.is_empty() {
        println!("all ZIP codes already imported");
        return Ok(0);
    }

    println!("uploading {} ZIP boundaries...", records.len());
    let mut uploaded = 0usize;
    for chunk in records.chunks(batch_size.max(1)) {
        let mut tx = db
            .pool
            .begin()
            .await
            .context("failed to open batch transaction")?;
        for record in chunk {
            sqlx::query(INSERT_SQL)
                .persistent(false)
                .bind(&record.zip_code)
                .bind(&record.geom_json)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("insert failed for ZIP {}", record.zip_code))?;
        }
        tx.commit().await.context("batch commit failed")?;
        uploaded += chunk.len();
        info!(uploaded, total = records.len(), "batch committed");
    }
    Ok(uploaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary(zip: &str) -> ZipBoundary {
        ZipBoundary {
            zip_code: zip.to_string(),
            geom_json: r#"{"type":"Polygon","coordinates":[]}"#.to_string(),
        }
    }

    #[test]
    fn partition_skips_keys_already_present() {
        let records = vec![boundary("60601"), boundary("60602"), boundary("60654")];
        let existing: HashSet<String> = ["60601".to_string()].into_iter().collect();
        let (to_insert, skipped) = partition_new(records, &existing);
        assert_eq!(skipped, 1);
        assert_eq!(to_insert.len(), 2);
        assert!(to_insert.iter().all(|r| r.zip_code != "60601"));
    }

    #[test]
    fn partition_with_empty_table_keeps_everything() {
        let records = vec![boundary("60601"), boundary("60602")];
        let (to_insert, skipped) = partition_new(records, &HashSet::new());
        assert_eq!(skipped, 0);
        assert_eq!(to_insert.len(), 2);
    }

    #[test]
    fn skipped_plus_to_insert_always_equals_input() {
        let records: Vec<ZipBoundary> =
            (0..137).map(|i| boundary(&format!("{:05}", i))).collect();
        let existing: HashSet<String> = (0..50).map(|i| format!("{:05}", i * 2)).collect();
        let total = records.len();
        let (to_insert, skipped) = partition_new(records, &existing);
        assert_eq!(to_insert.len() + skipped, total);
    }

    #[test]
    fn second_run_inserts_nothing() {
        // Idempotence: once every key is present, the to-insert set is empty.
        let records = vec![boundary("60601"), boundary("60602"), boundary("60654")];
        let existing: HashSet<String> =
            records.iter().map(|r| r.zip_code.clone()).collect();
        let (to_insert, skipped) = partition_new(records, &existing);
        assert!(to_insert.is_empty());
        assert_eq!(skipped, 3);
    }

    #[test]
    fn insert_statement_ignores_conflicting_keys_and_sets_srid() {
        assert!(INSERT_SQL.contains("ON CONFLICT (zcta5ce20) DO NOTHING"));
        assert!(INSERT_SQL.contains("ST_SetSRID"));
        assert!(INSERT_SQL.contains("4326"));
        assert!(INSERT_SQL.contains("ST_GeogFromWKB"));
    }
}
