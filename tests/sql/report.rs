use featherstore::error::Result;
use featherstore::Value;

use super::{record, setup};

#[tokio::test]
async fn registration_funnel() -> Result<()> {
    let (_dir, db) = setup(&[
        "INSERT INTO usuarios (id, registered) VALUES ('u1', TRUE)",
        "INSERT INTO usuarios (id, registered) VALUES ('u2', TRUE)",
        "INSERT INTO usuarios (id) VALUES ('u3')",
    ])
    .await?;
    let result = db
        .execute(
            "SELECT COUNT(*)::int AS total, COUNT(*) FILTER (WHERE registered = true)::int AS registrados FROM usuarios",
            &[],
        )
        .await?;
    assert_eq!(result.rows, vec![record(vec![("total", 3.into()), ("registrados", 2.into())])]);
    Ok(())
}

#[tokio::test]
async fn table_inventory() -> Result<()> {
    let (_dir, db) = setup(&["INSERT INTO stats (command) VALUES ('ping')"]).await?;
    let result = db
        .execute(
            "SELECT relname AS tabla, n_live_tup AS filas, pg_size_pretty(pg_total_relation_size(relid)) AS tamaño
             FROM pg_stat_user_tables ORDER BY pg_total_relation_size(relid) DESC",
            &[],
        )
        .await?;
    assert_eq!(result.row_count, 9);
    assert_eq!(result.rows[0]["tabla"], Value::from("stats"));
    assert_eq!(result.rows[0]["filas"], Value::Integer(1));
    Ok(())
}

#[tokio::test]
async fn database_size() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    let result = db.execute("SELECT pg_size_pretty(pg_database_size(current_database()))", &[]).await?;
    assert_eq!(result.rows, vec![record(vec![("pg_size_pretty", "0 B".into())])]);

    db.flush()?;
    let result = db
        .execute("SELECT pg_size_pretty(SUM(pg_total_relation_size(c.oid))) AS total FROM pg_class c", &[])
        .await?;
    assert_eq!(result.row_count, 1);
    assert!(result.rows[0]["total"].to_string().ends_with(" B"));
    Ok(())
}

#[tokio::test]
async fn chat_memory_ttl() -> Result<()> {
    let (_dir, db) = setup(&[
        "INSERT INTO group_settings (group_id, memory_ttl) VALUES ('g1', 3600)",
        "INSERT INTO group_settings (group_id, memory_ttl) VALUES ('g2', 0)",
        "INSERT INTO chat_memory (chat_id, updated_at) VALUES ('g1', 't1')",
        "INSERT INTO chat_memory (chat_id, updated_at) VALUES ('g2', 't2')",
        "INSERT INTO chat_memory (chat_id, updated_at) VALUES ('g3', 't3')",
    ])
    .await?;
    let result = db
        .execute(
            "SELECT cm.chat_id, cm.updated_at, COALESCE(gs.memory_ttl, 86400) AS memory_ttl
             FROM chat_memory cm LEFT JOIN group_settings gs ON gs.group_id = cm.chat_id",
            &[],
        )
        .await?;
    assert_eq!(
        result.rows,
        vec![
            record(vec![("chat_id", "g1".into()), ("updated_at", "t1".into()), ("memory_ttl", 3600.into())]),
            record(vec![("chat_id", "g3".into()), ("updated_at", "t3".into()), ("memory_ttl", 86400.into())]),
        ]
    );
    Ok(())
}
