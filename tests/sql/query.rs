use featherstore::error::Result;
use featherstore::{params, QueryResult, Value};

use super::{record, setup};

const USERS: [&str; 4] = [
    "INSERT INTO usuarios (id, name, money, registered) VALUES ('u1', 'carla', 30, TRUE)",
    "INSERT INTO usuarios (id, name, money, registered) VALUES ('u2', 'Bruno', 500, FALSE)",
    "INSERT INTO usuarios (id, name, money, registered) VALUES ('u3', 'ana', 120, TRUE)",
    "INSERT INTO usuarios (id, name, money, registered) VALUES ('u4', 'Dario', 75, FALSE)",
];

/// Defines async tests that run a query with parameters against the users fixture and
/// compare the projected rows.
macro_rules! test_query {
    ( $( $name:ident: $query:expr, $params:expr => $expect:expr, )* ) => {
    $(
        #[tokio::test]
        async fn $name() -> Result<()> {
            let (_dir, db) = setup(&USERS).await?;
            let result = db.execute($query, &$params).await?;
            let expect: Vec<featherstore::Record> = $expect;
            assert_eq!(result, QueryResult::from_rows(expect));
            Ok(())
        }
    )*
    }
}

test_query! {
    order_desc_limit: "SELECT id, money FROM usuarios ORDER BY money DESC LIMIT 2", params![] => vec![
        record(vec![("id", "u2".into()), ("money", 500.into())]),
        record(vec![("id", "u3".into()), ("money", 120.into())]),
    ],
    order_text: "SELECT name FROM usuarios ORDER BY name ASC", params![] => vec![
        record(vec![("name", "ana".into())]),
        record(vec![("name", "Bruno".into())]),
        record(vec![("name", "carla".into())]),
        record(vec![("name", "Dario".into())]),
    ],
    where_and_alias: "SELECT name AS nombre FROM usuarios WHERE registered = TRUE AND money > $1", params![50] => vec![
        record(vec![("nombre", "ana".into())]),
    ],
    lower_equals: "SELECT id FROM usuarios WHERE LOWER(name) = $1", params!["BRUNO"] => vec![
        record(vec![("id", "u2".into())]),
    ],
    aggregates: "SELECT COUNT(*)::int, SUM(money) AS total FROM usuarios WHERE registered = $1", params![true] => vec![
        record(vec![("count", 2.into()), ("total", 150.into())]),
    ],
    missing_table: "SELECT * FROM nowhere", params![] => vec![],
    unsupported_where: "SELECT * FROM usuarios WHERE name LIKE $1", params!["a%"] => vec![],
    unsupported_statement: "DROP TABLE usuarios", params![] => vec![],
}

#[tokio::test]
async fn timestamps_compare_with_now() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    db.execute(
        "INSERT INTO chat_memory (chat_id, updated_at) VALUES ($1, $2)",
        &params!["c1", "2001-01-01T00:00:00.000Z"],
    )
    .await?;
    db.execute("INSERT INTO chat_memory (chat_id, updated_at) VALUES ($1, NOW())", &params!["c2"]).await?;

    let result = db.execute("SELECT chat_id FROM chat_memory WHERE updated_at < $1", &params!["2020-01-01T00:00:00.000Z"]).await?;
    assert_eq!(result.rows, vec![record(vec![("chat_id", "c1".into())])]);

    let result = db.execute("SELECT chat_id FROM chat_memory WHERE updated_at <= NOW()", &[]).await?;
    assert_eq!(result.row_count, 2);
    assert!(matches!(result.rows[1]["chat_id"], Value::Text(_)));
    Ok(())
}

#[tokio::test]
async fn order_by_generated_timestamps() -> Result<()> {
    let (_dir, db) = setup(&[]).await?;
    db.execute(
        "INSERT INTO chat_memory (chat_id, updated_at) VALUES ($1, $2)",
        &params!["ancient", "2001-01-01T00:00:00.000Z"],
    )
    .await?;
    db.execute("INSERT INTO chat_memory (chat_id, updated_at) VALUES ($1, NOW())", &params!["old"]).await?;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    db.execute("INSERT INTO chat_memory (chat_id, updated_at) VALUES ($1, NOW())", &params!["new"]).await?;

    let result = db.execute("SELECT chat_id FROM chat_memory ORDER BY updated_at DESC", &[]).await?;
    let ids: Vec<&Value> = result.rows.iter().map(|row| &row["chat_id"]).collect();
    assert_eq!(ids, vec![&Value::from("new"), &Value::from("old"), &Value::from("ancient")]);

    let result = db.execute("SELECT chat_id FROM chat_memory ORDER BY updated_at ASC", &[]).await?;
    let ids: Vec<&Value> = result.rows.iter().map(|row| &row["chat_id"]).collect();
    assert_eq!(ids, vec![&Value::from("ancient"), &Value::from("old"), &Value::from("new")]);

    for mensaje in ["first", "second"] {
        db.execute("INSERT INTO reportes (sender_id, mensaje) VALUES ($1, $2)", &params!["u1", mensaje])
            .await?;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    let result = db.execute("SELECT mensaje FROM reportes ORDER BY fecha DESC", &[]).await?;
    assert_eq!(
        result.rows,
        vec![record(vec![("mensaje", "second".into())]), record(vec![("mensaje", "first".into())])]
    );
    Ok(())
}
