//! Migration tests
//!
//! Tests the address book schema on a real database file.

use fiber_storage_sqlite::migrations;
use rusqlite::Connection;
use tempfile::NamedTempFile;

#[test]
fn test_fresh_migration() {
    let file = NamedTempFile::new().unwrap();
    let conn = Connection::open(file.path()).unwrap();

    migrations::run_migrations(&conn).unwrap();

    verify_schema_v1(&conn);
}

#[test]
fn test_migration_idempotency() {
    let file = NamedTempFile::new().unwrap();
    let conn = Connection::open(file.path()).unwrap();

    migrations::run_migrations(&conn).unwrap();
    migrations::run_migrations(&conn).unwrap();

    verify_schema_v1(&conn);
    let versions: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(versions, 1);
}

#[test]
fn test_schema_version_tracking() {
    let file = NamedTempFile::new().unwrap();
    let conn = Connection::open(file.path()).unwrap();

    migrations::run_migrations(&conn).unwrap();

    assert_eq!(
        migrations::get_schema_version(&conn).unwrap(),
        migrations::SCHEMA_VERSION
    );
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn verify_schema_v1(conn: &Connection) {
    assert_eq!(column_names(conn, "config"), vec!["key", "value"]);
    assert_eq!(column_names(conn, "contacts"), vec!["id", "blob"]);

    // AUTOINCREMENT tables are tracked in sqlite_sequence
    let sequence: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'sqlite_sequence'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(sequence, 1);
}
