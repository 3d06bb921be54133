use std::time::Duration;

use featherstore::error::Result;
use featherstore::{params, Value};

use super::{open, setup};

#[tokio::test]
async fn debounced_writes_flush_once() -> Result<()> {
    let (dir, db) = setup(&[]).await?;
    for command in ["a", "b", "c"] {
        db.execute("INSERT INTO stats (command) VALUES ($1)", &params![command]).await?;
    }
    assert_eq!(db.flush_count(), 0);
    assert!(db.flush_pending());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(db.flush_count(), 1);
    assert!(!db.flush_pending());

    let snapshot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("database.json"))?)?;
    assert_eq!(snapshot["tables"]["stats"].as_array().map(Vec::len), Some(3));
    assert!(snapshot["autoIds"].is_object());
    Ok(())
}

#[tokio::test]
async fn reads_and_creates_do_not_flush() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    db.execute("SELECT * FROM usuarios", &[]).await?;
    db.execute("CREATE TABLE IF NOT EXISTS extra (id TEXT PRIMARY KEY)", &[]).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(db.flush_count(), 0);
    Ok(())
}

#[tokio::test]
async fn vacuum_and_alter_flush() -> Result<()> {
    let (_dir, db) = setup(&["INSERT INTO chats (id) VALUES ('c1')"]).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(db.flush_count(), 1);

    db.execute("VACUUM FULL", &[]).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(db.flush_count(), 2);

    db.execute("ALTER TABLE chats ADD COLUMN IF NOT EXISTS prefix TEXT[] DEFAULT ARRAY['/', '.']", &[]).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(db.flush_count(), 3);

    let result = db.execute("SELECT prefix FROM chats", &[]).await?;
    assert_eq!(result.rows[0]["prefix"], Value::from(vec!["/", "."]));
    Ok(())
}

#[tokio::test]
async fn reload_is_idempotent() -> Result<()> {
    let (dir, db) = setup(&[
        "INSERT INTO usuarios (id, name) VALUES ('u1', 'Ana')",
        "INSERT INTO characters (name) VALUES ('Rem')",
    ])
    .await?;
    db.flush()?;
    let first = std::fs::read_to_string(dir.path().join("database.json"))?;

    let reopened = open(dir.path());
    reopened.flush()?;
    let second = std::fs::read_to_string(dir.path().join("database.json"))?;
    assert_eq!(first, second);

    let result = reopened.execute("SELECT name FROM usuarios WHERE id = $1", &params!["u1"]).await?;
    assert_eq!(result.rows[0]["name"], Value::from("Ana"));
    Ok(())
}

#[tokio::test]
async fn reload_raises_id_counter() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("database.json"),
        r#"{"tables": {"characters": [{"id": 7, "name": "old"}]}, "autoIds": {"characters": 2}}"#,
    )?;
    let db = open(dir.path());
    let result = db.execute("INSERT INTO characters (name) VALUES ($1) RETURNING id", &params!["new"]).await?;
    assert_eq!(result.rows[0]["id"], Value::Integer(8));
    Ok(())
}

#[tokio::test]
async fn corrupt_file_starts_empty() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("database.json"), "{ not json")?;
    let db = open(dir.path());
    assert_eq!(db.execute("SELECT * FROM usuarios", &[]).await?.row_count, 0);
    assert!(db.tables().iter().any(|(name, rows)| name == "usuarios" && *rows == 0));
    Ok(())
}
