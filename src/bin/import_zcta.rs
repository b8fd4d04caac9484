use anyhow::Result;
use chrono::Utc;
use zipgeo::config::ImportConfig;
use zipgeo::database_ops::{db::Db, db::CONNECTION_HINTS, schema, upload, verify};
use zipgeo::{convert, geojson_src};

#[tokio::main]
async fn main() -> Result<()> {
    zipgeo::util::env::init_env();
    zipgeo::logging::init_tracing("info")?;

    println!("{}", "=".repeat(60));
    println!("TIGER/Line ZCTA5 ZIP Boundaries Import");
    println!("{}", "=".repeat(60));

    let cfg = ImportConfig::from_env()?;
    let started = Utc::now();

    // 1) Shapefile -> GeoJSON (skipped when the output already exists)
    convert::convert_shapefile(&cfg.shapefile, &cfg.geojson).await?;

    // 2) Read the boundaries before touching the database
    println!("\nreading GeoJSON: {}", cfg.geojson.display());
    let records = geojson_src::load_boundaries(&cfg.geojson)?;
    println!("loaded {} ZIP boundaries", records.len());

    // 3) Connect (print a redacted DSN so you know host/port/db/user)
    println!("\nconnecting to: {}", redact_url(&cfg.database_url));
    let db = match Db::connect(&cfg.database_url, cfg.max_connections).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("connection failed: {e}");
            eprintln!("\n{CONNECTION_HINTS}");
            return Err(e);
        }
    };

    // 4) Idempotent DDL, then resume filter, then chunked upload
    schema::ensure_schema(&cfg.database_url).await?;

    let existing = upload::existing_zip_codes(&db).await?;
    let (to_insert, skipped) = upload::partition_new(records, &existing);
    if skipped > 0 {
        println!("skipping {skipped} existing ZIP codes");
    }
    let uploaded = upload::upload_boundaries(&db, &to_insert, cfg.batch_size).await?;
    if uploaded > 0 {
        println!("\nsuccessfully uploaded {uploaded} ZIP boundaries");
    }

    // 5) Smoke check; never fails the job on a missing sample row
    verify::verify_upload(&db, &cfg.sample_zip).await?;

    println!("\n{}", "=".repeat(60));
    println!(
        "import complete in {}s",
        (Utc::now() - started).num_seconds()
    );
    println!("{}", "=".repeat(60));
    println!("\nnext steps:");
    println!("1. Test the lookup function:");
    println!("   SELECT * FROM get_zip_boundary('{}');", cfg.sample_zip);
    println!("2. Verify in your app by searching for a ZIP code");

    Ok(())
}

fn redact_url(url: &str) -> String {
    // crude redactor: hides password, preserves user@host:port/db and query
    match url.split_once("://") {
        Some((scheme, rest)) => {
            if let Some((creds, tail)) = rest.split_once('@') {
                let user = creds.split(':').next().unwrap_or("?");
                format!("{scheme}://{}:****@{tail}", user)
            } else {
                format!("{scheme}://{rest}")
            }
        }
        None => "<invalid-url>".into(),
    }
}
