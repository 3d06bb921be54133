use featherstore::error::Result;
use featherstore::{params, Value};

use super::{open, record, setup};

#[tokio::test]
async fn init_tables_seeds_missing_columns() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("database.json"),
        r#"{"tables": {
            "group_settings": [{"group_id": "g1", "welcome": false}],
            "usuarios": [{"id": "u1", "money": 5}],
            "subbots": [{"id": "bot1"}]
        }}"#,
    )?;
    let db = open(dir.path());
    db.init_tables().await?;

    let groups = db.execute("SELECT * FROM group_settings", &[]).await?;
    let group = &groups.rows[0];
    assert_eq!(group["welcome"], Value::Boolean(false));
    assert_eq!(group["detect"], Value::Boolean(true));
    assert_eq!(group["memory_ttl"], Value::Integer(86400));
    for column in ["nsfw_horario", "sWelcome", "sAutorespond", "primary_bot"] {
        assert_eq!(group[column], Value::Null, "{}", column);
    }

    let users = db.execute("SELECT id, money, role, lid, reg_time FROM usuarios", &[]).await?;
    assert_eq!(
        users.rows,
        vec![record(vec![
            ("id", "u1".into()),
            ("money", 5.into()),
            ("role", "novato".into()),
            ("lid", Value::Null),
            ("reg_time", Value::Null),
        ])]
    );

    let subbots = db.execute("SELECT prefix, tipo, anti_call FROM subbots", &[]).await?;
    assert_eq!(
        subbots.rows,
        vec![record(vec![
            ("prefix", vec!["/", ".", "#"].into()),
            ("tipo", "null".into()),
            ("anti_call", true.into()),
        ])]
    );
    Ok(())
}

#[tokio::test]
async fn init_tables_is_repeatable() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    db.init_tables().await?;
    db.execute("INSERT INTO group_settings (group_id, memory_ttl) VALUES ($1, 60)", &params!["g1"]).await?;

    db.init_tables().await?;
    let result = db.execute("SELECT memory_ttl FROM group_settings WHERE group_id = $1", &params!["g1"]).await?;
    assert_eq!(result.rows, vec![record(vec![("memory_ttl", 60.into())])]);
    assert_eq!(db.tables().len(), 9);
    Ok(())
}

#[tokio::test]
async fn subbot_config_falls_back() -> Result<()> {
    let (_dir, db) = setup(&[
        "INSERT INTO subbots (id, name, mode) VALUES ('5215550001', 'Mini', 'private')",
    ])
    .await?;

    let stored = db.subbot_config("5215550001:12").await;
    assert_eq!(stored["name"], Value::from("Mini"));
    assert_eq!(stored["mode"], Value::from("private"));
    assert_eq!(stored["anti_call"], Value::Boolean(true));

    let fallback = db.subbot_config("5215550002:3").await;
    assert_eq!(fallback["prefix"], Value::from(vec!["/", ".", "#"]));
    assert_eq!(fallback["mode"], Value::from("public"));
    assert_eq!(fallback["anti_private"], Value::Boolean(true));
    assert_eq!(fallback["anti_call"], Value::Boolean(false));
    assert_eq!(fallback["owners"], Value::List(vec![]));
    assert_eq!(fallback["tipo"], Value::Null);
    assert_eq!(fallback.len(), 10);
    Ok(())
}
