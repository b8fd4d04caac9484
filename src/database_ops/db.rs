use anyhow::Result;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let mut connect_options = PgConnectOptions::from_str(database_url)?
            // PgBouncer txn mode safe
            .statement_cache_capacity(0);

        // Ensure TLS is enabled when DSN contains sslmode=require
        if database_url.contains("sslmode=require") && !database_url.contains("sslmode=disable") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(connect_options)
            .await?;
        info!("connected to db");
        Ok(Self { pool })
    }
}

/// Remediation hints printed when the initial connection fails.
pub const CONNECTION_HINTS: &str = "\
troubleshooting:
  1. Get the correct connection string from your provider
     (Supabase: Dashboard -> Settings -> Database -> Connection string)
  2. Verify the database password is correct
  3. Check if your IP is allowed (Settings -> Database -> Connection Pooling)
  4. Prefer the session pooler (:5432) connection string
  then set SUPABASE_DB_URL or DATABASE_URL accordingly";
