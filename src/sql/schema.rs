use lazy_static::lazy_static;

use super::types::{Record, Value};

/// A field default, applied to inserted records that lack the field.
#[derive(Clone, Debug)]
pub enum FieldDefault {
    Static(Value),
    /// Computed on every insert.
    Generated(fn() -> Value),
}

impl FieldDefault {
    pub fn value(&self) -> Value {
        match self {
            FieldDefault::Static(value) => value.clone(),
            FieldDefault::Generated(generate) => generate(),
        }
    }
}

/// Metadata of a known table.
#[derive(Clone, Debug)]
pub struct Table {
    pub name: &'static str,
    /// The primary key fields; more than one forms a composite key.
    pub primary_key: &'static [&'static str],
    /// Whether missing primary keys are allocated from the table's counter.
    pub auto_increment: bool,
    pub defaults: Vec<(&'static str, FieldDefault)>,
}

impl Table {
    fn new(name: &'static str, primary_key: &'static [&'static str]) -> Self {
        Self { name, primary_key, auto_increment: false, defaults: Vec::new() }
    }

    fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    fn default<V: Into<Value>>(mut self, field: &'static str, value: V) -> Self {
        self.defaults.push((field, FieldDefault::Static(value.into())));
        self
    }

    fn generated(mut self, field: &'static str, generate: fn() -> Value) -> Self {
        self.defaults.push((field, FieldDefault::Generated(generate)));
        self
    }

    /// Fills in defaults for fields absent from the record. Fields present with a null
    /// value are left alone.
    pub fn apply_defaults(&self, row: &mut Record) {
        for (field, default) in &self.defaults {
            if !row.contains_key(*field) {
                row.insert(field.to_string(), default.value());
            }
        }
    }

    /// The single auto-increment key field, if the table has one.
    pub fn auto_id_field(&self) -> Option<&'static str> {
        match (self.auto_increment, self.primary_key) {
            (true, [field]) => Some(*field),
            _ => None,
        }
    }
}

lazy_static! {
    static ref CATALOG: Vec<Table> = vec![
        Table::new("group_settings", &["group_id"])
            .default("welcome", true)
            .default("detect", true)
            .default("antifake", false)
            .default("antilink", false)
            .default("antilink2", false)
            .default("modohorny", false)
            .default("audios", false)
            .default("antiStatus", false)
            .default("modoadmin", false)
            .default("photowelcome", false)
            .default("photobye", false)
            .default("autolevelup", true)
            .default("banned", false)
            .default("expired", 0)
            .default("memory_ttl", 86400),
        Table::new("usuarios", &["id"])
            .default("registered", false)
            .default("banned", false)
            .default("warn_pv", false)
            .default("warn", 0)
            .default("warn_antiporn", 0)
            .default("warn_estado", 0)
            .default("money", 100)
            .default("limite", 10)
            .default("exp", 0)
            .default("banco", 0)
            .default("level", 0)
            .default("role", "novato")
            .default("ry_time", 0)
            .default("lastwork", 0)
            .default("lastmiming", 0)
            .default("lastclaim", 0)
            .default("dailystreak", 0)
            .default("lastcofre", 0)
            .default("lastrob", 0)
            .default("lastslut", 0)
            .default("timevot", 0)
            .default("wait", 0)
            .default("crime", 0)
            .default("avisos_ban", 0)
            .default("marry", Value::Null)
            .default("marry_request", Value::Null),
        Table::new("chats", &["id"])
            .default("is_group", true)
            .default("is_active", true)
            .default("joined", true),
        Table::new("messages", &["user_id", "group_id"])
            .default("message_count", 0),
        Table::new("characters", &["id"])
            .auto_increment()
            .default("for_sale", false)
            .default("votes", 0),
        Table::new("subbots", &["id"])
            .default("prefix", vec!["/", ".", "#"])
            .default("mode", "public")
            .default("owners", Vec::<Value>::new())
            .default("anti_private", false)
            .default("anti_call", true)
            .default("privacy", false)
            .default("prestar", false),
        Table::new("reportes", &["id"])
            .auto_increment()
            .default("enviado", false)
            .default("tipo", "reporte")
            .generated("fecha", Value::now),
        Table::new("chat_memory", &["chat_id"])
            .generated("updated_at", Value::now),
        Table::new("stats", &["command"]),
    ];
}

/// Looks up a known table by name.
pub fn lookup(name: &str) -> Option<&'static Table> {
    CATALOG.iter().find(|table| table.name == name)
}

/// Iterates over all known tables, in declaration order.
pub fn tables() -> impl Iterator<Item = &'static Table> {
    CATALOG.iter()
}

/// Table creation and column additions run at startup, as (table, CREATE statement, added
/// columns with their type and default clause).
const BOOTSTRAP: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "group_settings",
        "CREATE TABLE IF NOT EXISTS group_settings (group_id TEXT PRIMARY KEY)",
        &[
            ("welcome", "BOOLEAN DEFAULT true"),
            ("detect", "BOOLEAN DEFAULT true"),
            ("antifake", "BOOLEAN DEFAULT false"),
            ("antilink", "BOOLEAN DEFAULT false"),
            ("antilink2", "BOOLEAN DEFAULT false"),
            ("modohorny", "BOOLEAN DEFAULT false"),
            ("audios", "BOOLEAN DEFAULT false"),
            ("nsfw_horario", "TEXT"),
            ("antiStatus", "BOOLEAN DEFAULT false"),
            ("modoadmin", "BOOLEAN DEFAULT false"),
            ("photowelcome", "BOOLEAN DEFAULT false"),
            ("photobye", "BOOLEAN DEFAULT false"),
            ("autolevelup", "BOOLEAN DEFAULT true"),
            ("sWelcome", "TEXT"),
            ("sBye", "TEXT"),
            ("sPromote", "TEXT"),
            ("sDemote", "TEXT"),
            ("banned", "BOOLEAN DEFAULT false"),
            ("expired", "BIGINT DEFAULT 0"),
            ("memory_ttl", "INTEGER DEFAULT 86400"),
            ("sAutorespond", "TEXT"),
            ("primary_bot", "TEXT"),
        ],
    ),
    (
        "usuarios",
        "CREATE TABLE IF NOT EXISTS usuarios (id TEXT PRIMARY KEY)",
        &[
            ("nombre", "TEXT"),
            ("registered", "BOOLEAN DEFAULT false"),
            ("num", "TEXT"),
            ("lid", "TEXT UNIQUE"),
            ("banned", "BOOLEAN DEFAULT false"),
            ("warn_pv", "BOOLEAN DEFAULT false"),
            ("warn", "INTEGER DEFAULT 0"),
            ("warn_antiporn", "INTEGER DEFAULT 0"),
            ("warn_estado", "INTEGER DEFAULT 0"),
            ("edad", "INTEGER"),
            ("money", "INTEGER DEFAULT 100"),
            ("limite", "INTEGER DEFAULT 10"),
            ("exp", "INTEGER DEFAULT 0"),
            ("banco", "INTEGER DEFAULT 0"),
            ("level", "INTEGER DEFAULT 0"),
            ("role", "TEXT DEFAULT 'novato'"),
            ("reg_time", "TIMESTAMP"),
            ("serial_number", "TEXT"),
            ("sticker_packname", "TEXT"),
            ("sticker_author", "TEXT"),
            ("ry_time", "BIGINT DEFAULT 0"),
            ("lastwork", "BIGINT DEFAULT 0"),
            ("lastmiming", "BIGINT DEFAULT 0"),
            ("lastclaim", "BIGINT DEFAULT 0"),
            ("dailystreak", "BIGINT DEFAULT 0"),
            ("lastcofre", "BIGINT DEFAULT 0"),
            ("lastrob", "BIGINT DEFAULT 0"),
            ("lastslut", "BIGINT DEFAULT 0"),
            ("timevot", "BIGINT DEFAULT 0"),
            ("wait", "BIGINT DEFAULT 0"),
            ("crime", "BIGINT DEFAULT 0"),
            ("marry", "TEXT DEFAULT NULL"),
            ("marry_request", "TEXT DEFAULT NULL"),
            ("razon_ban", "TEXT"),
            ("avisos_ban", "INTEGER DEFAULT 0"),
            ("gender", "TEXT"),
            ("birthday", "DATE"),
        ],
    ),
    (
        "chats",
        "CREATE TABLE IF NOT EXISTS chats (id TEXT PRIMARY KEY, is_group BOOLEAN DEFAULT true, \
         timestamp BIGINT, is_active BOOLEAN DEFAULT true, bot_id TEXT, joined BOOLEAN DEFAULT true)",
        &[],
    ),
    (
        "messages",
        "CREATE TABLE IF NOT EXISTS messages (user_id TEXT, group_id TEXT, \
         message_count INTEGER DEFAULT 0, PRIMARY KEY (user_id, group_id))",
        &[],
    ),
    (
        "characters",
        "CREATE TABLE IF NOT EXISTS characters (id SERIAL PRIMARY KEY)",
        &[
            ("name", "TEXT NOT NULL"),
            ("url", "TEXT NOT NULL"),
            ("tipo", "TEXT"),
            ("anime", "TEXT"),
            ("rareza", "TEXT"),
            ("price", "INTEGER NOT NULL"),
            ("previous_price", "INTEGER"),
            ("claimed_by", "TEXT"),
            ("for_sale", "BOOLEAN DEFAULT false"),
            ("seller", "TEXT"),
            ("votes", "INTEGER DEFAULT 0"),
            ("last_removed_time", "BIGINT"),
        ],
    ),
    (
        "reportes",
        "CREATE TABLE IF NOT EXISTS reportes (id SERIAL PRIMARY KEY, sender_id TEXT NOT NULL, \
         sender_name TEXT, mensaje TEXT NOT NULL, fecha TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
         enviado BOOLEAN DEFAULT false, tipo TEXT DEFAULT 'reporte')",
        &[],
    ),
    (
        "subbots",
        "CREATE TABLE IF NOT EXISTS subbots (id TEXT PRIMARY KEY)",
        &[
            ("tipo", "TEXT DEFAULT 'null'"),
            ("name", "TEXT"),
            ("logo_url", "TEXT"),
            ("prefix", "TEXT[] DEFAULT ARRAY['/', '.', '#']"),
            ("mode", "TEXT DEFAULT 'public'"),
            ("owners", "TEXT[]"),
            ("anti_private", "BOOLEAN DEFAULT false"),
            ("anti_call", "BOOLEAN DEFAULT true"),
            ("privacy", "BOOLEAN DEFAULT false"),
            ("prestar", "BOOLEAN DEFAULT false"),
        ],
    ),
    (
        "chat_memory",
        "CREATE TABLE IF NOT EXISTS chat_memory (chat_id TEXT PRIMARY KEY, history JSONB, \
         updated_at TIMESTAMP DEFAULT NOW())",
        &[],
    ),
    (
        "stats",
        "CREATE TABLE IF NOT EXISTS stats (command TEXT PRIMARY KEY, count INTEGER DEFAULT 1)",
        &[],
    ),
];

/// The startup schema statements, in order: each table's CREATE TABLE followed by its
/// ALTER TABLE ... ADD COLUMN IF NOT EXISTS statements.
pub fn bootstrap() -> Vec<String> {
    let mut statements = Vec::new();
    for (table, create, columns) in BOOTSTRAP {
        statements.push(create.to_string());
        for (column, definition) in columns.iter() {
            statements.push(format!(
                "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
                table, column, definition
            ));
        }
    }
    statements
}

/// The subbot configuration used when a bot has no stored settings.
pub fn subbot_fallback() -> Record {
    [
        ("prefix", Value::from(vec!["/", ".", "#"])),
        ("mode", Value::from("public")),
        ("anti_private", Value::Boolean(true)),
        ("anti_call", Value::Boolean(false)),
        ("owners", Value::List(vec![])),
        ("name", Value::Null),
        ("logo_url", Value::Null),
        ("privacy", Value::Null),
        ("prestar", Value::Null),
        ("tipo", Value::Null),
    ]
    .into_iter()
    .map(|(field, value)| (field.to_string(), value))
    .collect()
}
