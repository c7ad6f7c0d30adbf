//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive one placement session from stdin, one JSON command per line.
//! - Persist groups in a SQLite file; geometry, selection and display are
//!   the bounded in-memory scene hosts.
//!
//! # Environment
//! - `NOTEARCH_DB_PATH`: group database file (default: temp dir).
//! - `NOTEARCH_LOG_LEVEL`: `trace|debug|info|warn|error`.
//! - `NOTEARCH_LOG_DIR`: absolute log directory (default: temp dir).
//! - `NOTEARCH_CONFIG`: optional JSON `EngineConfig` file.

use log::info;
use notearch_bridge::api::{dispatch, CommandResponse};
use notearch_core::db::open_db;
use notearch_core::{
    default_log_level, init_logging_with, EngineConfig, LoggingConfig, PlacementEngine,
    SessionHost, SqliteGroupStore,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_DB_FILE_NAME: &str = "notearch_groups.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "notearch-logs";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("notearch: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    init_logging_with(&LoggingConfig {
        level: env_or("NOTEARCH_LOG_LEVEL", default_log_level().to_string()),
        log_dir: env_or(
            "NOTEARCH_LOG_DIR",
            std::env::temp_dir()
                .join(DEFAULT_LOG_DIR_NAME)
                .to_string_lossy()
                .into_owned(),
        ),
        echo_warnings: true,
        ..LoggingConfig::default()
    })?;

    let config = match env_var("NOTEARCH_CONFIG") {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let db_path = env_var("NOTEARCH_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
    let conn = open_db(&db_path).map_err(|err| format!("group DB open failed: {err}"))?;

    let host = SessionHost::session(SqliteGroupStore::new(&conn), config.history_capacity);
    let mut engine = PlacementEngine::new(host, config);
    let loaded = engine
        .load_groups_from_store()
        .map_err(|err| format!("group load failed: {err}"))?;
    info!(
        "event=cli_start module=cli status=ok db_path={} groups={loaded}",
        db_path.display()
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.map_err(|err| format!("stdin read failed: {err}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let response: CommandResponse = dispatch(&mut engine, &line);
        writeln!(stdout, "{}", response.to_json_line())
            .map_err(|err| format!("stdout write failed: {err}"))?;
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(name: &str, fallback: String) -> String {
    env_var(name).unwrap_or(fallback)
}
