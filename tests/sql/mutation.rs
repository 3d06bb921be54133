use featherstore::error::{Error, Result};
use featherstore::{params, Value};

use super::{record, setup};

#[tokio::test]
async fn insert_keeps_first_row_for_duplicate_key() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    let insert = "INSERT INTO usuarios (id, name) VALUES ($1, $2)";
    db.execute(insert, &params!["u1", "first"]).await?;
    let result = db.execute(insert, &params!["u1", "second"]).await?;
    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0]["name"], Value::from("first"));

    let all = db.execute("SELECT * FROM usuarios WHERE id = $1", &params!["u1"]).await?;
    assert_eq!(all.row_count, 1);
    Ok(())
}

#[tokio::test]
async fn insert_fills_defaults() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    let result = db
        .execute("INSERT INTO group_settings (group_id) VALUES ($1) RETURNING *", &params!["g1"])
        .await?;
    let row = &result.rows[0];
    assert_eq!(row.len(), 16);
    assert_eq!(row["welcome"], Value::Boolean(true));
    assert_eq!(row["antilink"], Value::Boolean(false));
    assert_eq!(row["memory_ttl"], Value::Integer(86400));

    let result = db
        .execute("INSERT INTO usuarios (id, money) VALUES ($1, $2) RETURNING id, money, role", &params!["u1", 5])
        .await?;
    assert_eq!(
        result.rows,
        vec![record(vec![("id", "u1".into()), ("money", 5.into()), ("role", "novato".into())])]
    );
    Ok(())
}

#[tokio::test]
async fn upsert_adds_to_existing_value() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    let upsert = "INSERT INTO characters (id, name, price) VALUES ($1, $2, $3) \
                  ON CONFLICT (id) DO UPDATE SET price = characters.price + $4 RETURNING price";
    db.execute(upsert, &params![1, "Rem", 10, 5]).await?;
    let result = db.execute(upsert, &params![1, "Rem", 10, 5]).await?;
    assert_eq!(result.rows, vec![record(vec![("price", 15.into())])]);
    Ok(())
}

#[tokio::test]
async fn autoincrement_ids() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    for (name, id) in [("a", 1), ("b", 2), ("c", 3)] {
        let result = db.execute("INSERT INTO characters (name) VALUES ($1) RETURNING id", &params![name]).await?;
        assert_eq!(result.rows[0]["id"], Value::Integer(id));
    }
    Ok(())
}

#[tokio::test]
async fn composite_key_conflicts() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    let insert = "INSERT INTO messages (user_id, group_id, message_count) VALUES ($1, $2, 1) \
                  ON CONFLICT (user_id, group_id) DO UPDATE SET message_count = messages.message_count + 1";
    db.execute(insert, &params!["u1", "g1"]).await?;
    db.execute(insert, &params!["u1", "g1"]).await?;
    db.execute(insert, &params!["u1", "g2"]).await?;

    let result = db.execute("SELECT * FROM messages ORDER BY group_id", &[]).await?;
    assert_eq!(result.row_count, 2);
    assert_eq!(result.rows[0]["message_count"], Value::Integer(2));
    assert_eq!(result.rows[1]["message_count"], Value::Integer(1));
    Ok(())
}

#[tokio::test]
async fn update_and_delete() -> Result<()> {
    let (_dir, db) = setup(&[
        "INSERT INTO usuarios (id, name) VALUES ('u1', 'Ana')",
        "INSERT INTO usuarios (id, name) VALUES ('u2', 'Bruno')",
    ])
    .await?;

    let result = db
        .execute(
            "UPDATE usuarios SET money = money - $1, banco = GREATEST(banco, $1) WHERE LOWER(name) = $2 RETURNING money, banco",
            &params![30, "ana"],
        )
        .await?;
    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows, vec![record(vec![("money", 70.into()), ("banco", 30.into())])]);

    let result = db
        .execute("UPDATE usuarios SET marry = COALESCE(marry, $1) WHERE marry IS NULL", &params!["u9"])
        .await?;
    assert_eq!(result.row_count, 2);

    let result = db.execute("DELETE FROM usuarios WHERE id = $1 AND money < 100", &params!["u1"]).await?;
    assert_eq!(result.row_count, 1);
    let result = db.execute("SELECT * FROM usuarios", &[]).await?;
    assert_eq!(result.row_count, 1);
    Ok(())
}

#[tokio::test]
async fn unsupported_writes_raise() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    for statement in [
        "INSERT INTO usuarios (id) VALUES ($1), ($2)",
        "UPDATE usuarios SET money = 0",
        "DELETE FROM usuarios WHERE id IN ($1)",
        "UPDATE usuarios SET money = 0 WHERE id = $1 OR 1=1",
    ] {
        match db.execute(statement, &params!["u1", "u2"]).await {
            Err(Error::Unsupported(_)) => {},
            result => panic!("Expected unsupported error for {}, got {:?}", statement, result),
        }
    }
    Ok(())
}
