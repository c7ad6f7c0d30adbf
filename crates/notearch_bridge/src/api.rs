//! Use-case API for panel-facing calls.
//!
//! # Responsibility
//! - Expose stable, command-level functions to the panel host via FRB.
//! - Turn every engine outcome or error into one response envelope.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Envelope messages are UTF-8 strings with stable meaning.

use log::{debug, warn};
use notearch_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CommandOutcome, EngineCommand, EngineConfig, EngineHost, GroupId, GroupSnapshot,
    MemoryGroupStore, PlacementEngine, SessionHost,
};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

type PanelSession = PlacementEngine<SessionHost<MemoryGroupStore>>;

static SESSION: OnceLock<Mutex<PanelSession>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Response envelope for one panel command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    /// Whether the command ran; guarded no-ops still count as success.
    pub ok: bool,
    /// Current group after the command, if any.
    pub group_id: Option<GroupId>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
    /// Panel values of the current group after the command.
    pub snapshot: Option<GroupSnapshot>,
}

impl CommandResponse {
    fn success<H: EngineHost>(engine: &PlacementEngine<H>, message: impl Into<String>) -> Self {
        let snapshot = engine.snapshot();
        Self {
            ok: true,
            group_id: snapshot.as_ref().map(|snapshot| snapshot.id),
            message: message.into(),
            snapshot,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            group_id: None,
            message: message.into(),
            snapshot: None,
        }
    }

    /// Single-line JSON form; falls back to a fixed failure line.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            format!(r#"{{"ok":false,"group_id":null,"message":"encode failed: {err}","snapshot":null}}"#)
        })
    }
}

/// Parses one JSON command and runs it against `engine`.
///
/// Accepts `{"command": "<snake_case name>", ...args}`.
pub fn dispatch<H: EngineHost>(engine: &mut PlacementEngine<H>, raw: &str) -> CommandResponse {
    let command = match serde_json::from_str::<EngineCommand>(raw.trim()) {
        Ok(command) => command,
        Err(err) => {
            warn!("event=bridge_dispatch module=bridge status=error error_code=bad_command error={err}");
            return CommandResponse::failure(format!("invalid command: {err}"));
        }
    };
    dispatch_command(engine, command)
}

/// Runs an already parsed command against `engine`.
pub fn dispatch_command<H: EngineHost>(
    engine: &mut PlacementEngine<H>,
    command: EngineCommand,
) -> CommandResponse {
    let name = command.name();
    match engine.execute(command) {
        Ok(outcome) => {
            debug!("event=bridge_dispatch module=bridge status=ok command={name}");
            CommandResponse::success(engine, describe(name, &outcome))
        }
        Err(err) => {
            warn!("event=bridge_dispatch module=bridge status=error command={name} error={err}");
            CommandResponse::failure(format!("{name} failed: {err}"))
        }
    }
}

/// Runs one JSON command against the process-wide panel session.
///
/// # FFI contract
/// - Sync call; engine work is in-memory arithmetic plus host bookkeeping.
/// - Never panics; malformed input yields `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn session_execute(command_json: String) -> CommandResponse {
    let mut engine = lock_session();
    dispatch(&mut *engine, &command_json)
}

/// Replaces the process-wide session with a fresh engine.
///
/// `config_json` is a partial `EngineConfig`; `None` uses defaults. Returns
/// empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn session_reset(config_json: Option<String>) -> String {
    let config = match config_json.as_deref().map(EngineConfig::from_json_str) {
        None => EngineConfig::default(),
        Some(Ok(config)) => config,
        Some(Err(err)) => return err,
    };
    *lock_session() = new_session(config);
    debug!("event=session_reset module=bridge status=ok");
    String::new()
}

fn new_session(config: EngineConfig) -> PanelSession {
    let host = SessionHost::session(MemoryGroupStore::default(), config.history_capacity);
    PlacementEngine::new(host, config)
}

fn lock_session() -> MutexGuard<'static, PanelSession> {
    SESSION
        .get_or_init(|| Mutex::new(new_session(EngineConfig::default())))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn describe(name: &str, outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Done => format!("{name} ok."),
        CommandOutcome::GroupCreated(id) => format!("Group {id} created."),
        CommandOutcome::Placed(Some(record)) => format!("Note placed ({}).", record.duration),
        CommandOutcome::Placed(None) => "No group selected.".to_string(),
        CommandOutcome::Undone(Some(record)) => format!("Placement undone ({}).", record.duration),
        CommandOutcome::Undone(None) => "Nothing to undo.".to_string(),
        CommandOutcome::Loaded(count) => format!("Loaded {count} group(s)."),
        CommandOutcome::GuideLine(Some((start, end))) => format!("Guide line {start} -> {end}."),
        CommandOutcome::GuideLine(None) => "No guide line.".to_string(),
        CommandOutcome::Snapshot(Some(snapshot)) => format!("Group {} selected.", snapshot.id),
        CommandOutcome::Snapshot(None) => "No group selected.".to_string(),
    }
}
