use std::time::{Duration, SystemTime, UNIX_EPOCH};

use featherstore::error::{Error, Result};
use featherstore::sql::parser::{Lexer, Symbol, Token};
use featherstore::{Database, Options};
use log::{LevelFilter, Metadata, Record};
use rustyline::error::ReadlineError;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{history::DefaultHistory, Editor};
use rustyline_derive::{Completer, Helper, Highlighter, Hinter};
use serde_derive::Deserialize;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::new(args.get(1).map(String::as_str))?;

    let level = config.log_level.parse::<LevelFilter>().map_err(|_| {
        Error::Config(format!("Invalid log level {}", config.log_level))
    })?;
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);

    let options = Options { debounce: Duration::from_millis(config.flush_debounce_ms) };
    let db = Database::open_with(&config.data_file, options);
    db.init_tables().await?;
    let mut shell = Shell::new(db)?;
    let result = shell.run().await;
    shell.db.flush()?;
    result
}

#[derive(Debug, Deserialize)]
struct Config {
    data_file: String,
    flush_debounce_ms: u64,
    log_level: String,
}

impl Config {
    fn new(file: Option<&str>) -> Result<Self> {
        let mut c = config::Config::builder()
            .set_default("data_file", "database.json")?
            .set_default("flush_debounce_ms", 200)?
            .set_default("log_level", "info")?;
        if let Some(file) = file {
            c = c.add_source(config::File::with_name(file));
        }
        c = c.add_source(config::Environment::with_prefix("FEATHERSTORE"));

        Ok(c.build()?.try_deserialize()?)
    }
}

/// Writes log lines to stderr as `[LEVEL] <epoch-secs> message`.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let ts = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        eprintln!("[{}] {} {}", record.level(), ts, record.args());
    }

    fn flush(&self) {}
}

/// An interactive shell over an open database.
struct Shell {
    db: Database,
    editor: Editor<InputValidator, DefaultHistory>,
}

impl Shell {
    fn new(db: Database) -> Result<Self> {
        let editor = Editor::new()?;
        Ok(Self { db, editor })
    }

    /// Runs the REPL until end of input.
    async fn run(&mut self) -> Result<()> {
        self.editor.set_helper(Some(InputValidator));
        // Make sure multiline pastes are interpreted as normal inputs.
        self.editor.bind_sequence(
            rustyline::KeyEvent(rustyline::KeyCode::BracketedPasteStart, rustyline::Modifiers::NONE),
            rustyline::Cmd::Noop,
        );
        println!("Opened {}. Enter !help for instructions.", self.db.path().display());

        while let Some(input) = self.prompt()? {
            match self.execute(&input).await {
                Ok(()) => {},
                err @ Err(Error::Internal(_)) => return err,
                Err(err) => println!("  Error: {}", err),
            }
        }
        Ok(())
    }

    fn prompt(&mut self) -> Result<Option<String>> {
        match self.editor.readline("featherstore> ") {
            Ok(input) => {
                self.editor.add_history_entry(&input)?;
                Ok(Some(input.trim().to_string()))
            },
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn execute(&mut self, input: &str) -> Result<()> {
        if input.is_empty() {
            return Ok(());
        }
        match input.starts_with('!') {
            true => self.execute_command(input),
            false => self.execute_query(input).await,
        }
    }

    /// Runs a statement and prints each row as a JSON line.
    async fn execute_query(&mut self, query: &str) -> Result<()> {
        let result = self.db.execute(query, &[]).await?;
        for row in &result.rows {
            println!("  {}", serde_json::to_string(row)?);
        }
        println!("  ({} rows)", result.row_count);
        Ok(())
    }

    /// Handles a shell command (prefixed by !, e.g. !help).
    fn execute_command(&mut self, input: &str) -> Result<()> {
        let mut input = input.split_ascii_whitespace();
        let command = input.next().ok_or_else(|| Error::Parse("Expected command.".to_string()))?;
        if let Some(arg) = input.next() {
            return Err(Error::Parse(format!("{}: unexpected argument {}", command, arg)));
        }

        match command {
            "!help" => println!(
                r#"
Enter a SQL statement terminated by a semicolon (;) to execute it and display the rows.
Parameters are not available here; inline literal values instead.
The following commands are also available:

    !flush             Write the snapshot to disk now
    !help              This help message
    !tables            List tables with their row counts
"#
            ),
            "!flush" => {
                self.db.flush()?;
                println!("  Flushed to {}", self.db.path().display());
            },
            "!tables" => {
                for (name, rows) in self.db.tables() {
                    println!("  {} ({} rows)", name, rows);
                }
            },
            c => return Err(Error::Parse(format!("Unknown command {}", c))),
        }
        Ok(())
    }
}

/// A Rustyline helper for multiline editing: a statement is complete once it has a semicolon.
#[derive(Completer, Helper, Highlighter, Hinter)]
struct InputValidator;

impl Validator for InputValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        if input.is_empty() || input.starts_with('!') || input == ";" {
            return Ok(ValidationResult::Valid(None));
        }

        // Lexer errors are accepted here and reported by the statement parser.
        for result in Lexer::new(input) {
            match result {
                Ok(Token::Symbol(Symbol::Semicolon)) => return Ok(ValidationResult::Valid(None)),
                Err(_) => return Ok(ValidationResult::Valid(None)),
                _ => {},
            }
        }
        Ok(ValidationResult::Incomplete)
    }

    fn validate_while_typing(&self) -> bool {
        false
    }
}
