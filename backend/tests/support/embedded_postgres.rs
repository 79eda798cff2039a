//! Embedded PostgreSQL helpers for integration tests.
//!
//! - Each test gets its own database cloned from a template that already
//!   carries the schema, so suites stay isolated without re-running
//!   migrations per test.
//! - The template name embeds a hash of the migrations directory; editing a
//!   migration provisions a fresh template.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;
use fleet_tracker::outbound::persistence::MIGRATIONS;
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use postgres::{Client, NoTls};
use uuid::Uuid;

use super::format_postgres_error;

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const TEMPLATE_NAME_PREFIX: &str = "fleet_template";
const PROVISION_RETRIES: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);
const STABLE_PASSWORD: &str = "fleet_embedded_test";

/// Returns the process-wide embedded cluster, starting it on first use.
///
/// `PG_PASSWORD` is pinned before bootstrap: a reused data directory keeps
/// the password chosen at `initdb`, and the library otherwise generates a
/// new one per process.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster library spawns threads; the shared
        // handle is created at most once per process.
        unsafe {
            std::env::set_var("PG_PASSWORD", STABLE_PASSWORD);
        }
    }

    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) if attempt < PROVISION_RETRIES => {
                eprintln!("pg-embed: attempt {attempt}/{PROVISION_RETRIES} failed: {error:?}");
                std::thread::sleep(RETRY_DELAY);
                attempt += 1;
            }
            Err(error) => return Err(format!("{error:?}")),
        }
    }
}

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn template_database_name() -> Result<String, String> {
    let hash = hash_directory(migrations_dir()).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

/// Creates or reuses a template database with the latest migrations applied.
fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;

    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&template_name);
        migrate_schema(&url)?;
    }

    Ok(template_name)
}

/// Provisions a temporary database cloned from the migration template.
pub fn provision_template_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let mut last_error = String::from("create database from template: exhausted retries");
    for attempt in 1..=PROVISION_RETRIES {
        let result = ensure_template_database(cluster).and_then(|template| {
            let db_name = format!("test_{}", Uuid::new_v4().simple());
            cluster
                .temporary_database_from_template(db_name.as_str(), template.as_str())
                .map_err(|err| format!("create database from template: {err:?}"))
        });
        match result {
            Ok(database) => return Ok(database),
            Err(error) => last_error = format!("attempt {attempt}/{PROVISION_RETRIES}: {error}"),
        }
        if attempt < PROVISION_RETRIES {
            std::thread::sleep(RETRY_DELAY);
        }
    }
    Err(last_error)
}

/// Runs all pending Diesel migrations against the given database.
pub fn migrate_schema(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| format!("connect: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("migration: {err}"))?;
    Ok(())
}

/// Count rows in `table` that reference `device_id`, bypassing the
/// repositories under test.
pub fn count_device_rows(url: &str, table: &str, device_id: i64) -> Result<i64, String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let query = format!("SELECT COUNT(*) FROM {table} WHERE device_id = $1");
    let row = client
        .query_one(query.as_str(), &[&device_id])
        .map_err(|err| format_postgres_error(&err))?;
    Ok(row.get(0))
}
