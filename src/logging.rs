//! Structured JSON-lines logging for the strategy client.
//!
//! Every record is one JSON object on stderr, so it never interleaves with
//! the frames printed on stdout. When `LOG_DIR` is set the same records are
//! appended to `<LOG_DIR>/<RUN_ID>/events.jsonl` (trace/debug go to
//! `trace.jsonl`). Prompts are never logged verbatim: callers pass
//! [`prompt_fields`] which carries only length and a short digest.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    /// Defaults to `warn`: the terminal is shared with the rendered frames.
    pub fn from_env() -> Self {
        std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Level::parse(&v))
            .unwrap_or(Level::Warn)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    View,    // Submit lifecycle, diagnostics surfaced to the user implicitly
    Http,    // Outbound requests and responses
    System,  // Startup, shutdown
    Profile, // Request timing
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::View => "view",
            Domain::Http => "http",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

thread_local! {
    static CAPTURED: RefCell<Option<Vec<Value>>> = const { RefCell::new(None) };
}

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    files: Option<RunFiles>,
}

#[derive(Debug)]
struct RunFiles {
    events: Mutex<BufWriter<std::fs::File>>,
    trace: Mutex<BufWriter<std::fs::File>>,
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let files = std::env::var("LOG_DIR")
            .ok()
            .and_then(|base| open_run_files(PathBuf::from(base), &run_id));
        RunContext { run_id, files }
    })
}

fn open_run_files(base: PathBuf, run_id: &str) -> Option<RunFiles> {
    let run_dir = base.join(run_id);
    if let Err(err) = create_dir_all(&run_dir) {
        eprintln!("[log] failed to create run dir {}: {}", run_dir.display(), err);
        return None;
    }
    let open = |name: &str| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(run_dir.join(name))
            .map_err(|err| eprintln!("[log] failed to open {}: {}", name, err))
            .ok()
    };
    let events = open("events.jsonl")?;
    let trace = open("trace.jsonl")?;
    Some(RunFiles {
        events: Mutex::new(BufWriter::new(events)),
        trace: Mutex::new(BufWriter::new(trace)),
    })
}

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in ["authorization", "Authorization", "api_key", "prompt"] {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["url", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Mutex<BufWriter<std::fs::File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let fields = sanitize_fields(fields);
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));

    let record = Value::Object(entry);
    let line = record.to_string();
    if let Some(files) = &ctx.files {
        match level {
            Level::Trace | Level::Debug => write_line(&files.trace, &line),
            _ => write_line(&files.events, &line),
        }
    }
    CAPTURED.with(|cell| {
        if let Some(records) = cell.borrow_mut().as_mut() {
            records.push(record);
        }
    });
    eprintln!("{}", line);
}

// =============================================================================
// Capture (records emitted on the current thread)
// =============================================================================

/// Collects every record emitted on this thread until dropped.
pub struct Capture {
    _not_send: std::marker::PhantomData<*const ()>,
}

pub fn capture() -> Capture {
    CAPTURED.with(|cell| *cell.borrow_mut() = Some(Vec::new()));
    Capture {
        _not_send: std::marker::PhantomData,
    }
}

impl Capture {
    pub fn records(&self) -> Vec<Value> {
        CAPTURED.with(|cell| cell.borrow().clone().unwrap_or_default())
    }

    pub fn events(&self, event: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r.get("event").and_then(Value::as_str) == Some(event))
            .collect()
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        CAPTURED.with(|cell| *cell.borrow_mut() = None);
    }
}

// =============================================================================
// Domain-specific helpers
// =============================================================================

pub fn log_request_start(method: &str, url: &str, prompt: Option<&str>) {
    let mut fields = obj(&[("method", v_str(method)), ("url", v_str(url))]);
    if let Some(p) = prompt {
        fields.extend(prompt_fields(p));
    }
    log(Level::Debug, Domain::Http, "request_start", fields);
}

/// `checked` responses are the ones whose status decides the outcome; only
/// those warn on non-2xx. A submission's status never does, so its failure
/// is reported once, by `request_failed`.
pub fn log_response(method: &str, url: &str, status: u16, bytes: usize, checked: bool) {
    let level = if checked && !(200..300).contains(&status) { Level::Warn } else { Level::Debug };
    log(
        level,
        Domain::Http,
        "response",
        obj(&[
            ("method", v_str(method)),
            ("url", v_str(url)),
            ("status", json!(status)),
            ("bytes", json!(bytes)),
        ]),
    );
}

/// The one diagnostic entry per failed submission.
pub fn log_request_failed(kind: &str, error: &str, prompt: &str) {
    let mut fields = obj(&[
        ("msg", v_str("strategy request failed")),
        ("kind", v_str(kind)),
        ("error", v_str(error)),
    ]);
    fields.extend(prompt_fields(prompt));
    log(Level::Error, Domain::View, "request_failed", fields);
}

pub fn log_result_stored(id: Option<u64>, name: &str) {
    log(
        Level::Info,
        Domain::View,
        "result_stored",
        obj(&[
            ("id", id.map(|i| json!(i)).unwrap_or(Value::Null)),
            ("strategy_name", v_str(name)),
        ]),
    );
}

pub fn log_submit_ignored(reason: &str) {
    log(Level::Debug, Domain::View, "submit_ignored", obj(&[("reason", v_str(reason))]));
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Length and a 12-hex-digit digest, enough to correlate without leaking text.
pub fn prompt_fields(prompt: &str) -> Map<String, Value> {
    obj(&[
        ("prompt_len", json!(prompt.chars().count())),
        ("prompt_sha", v_str(&prompt_digest(prompt))),
    ])
}

pub fn prompt_digest(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    hex::encode(&digest[..6])
}

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits `elapsed_ms` at trace level when dropped.
pub struct ProfileScope {
    label: &'static str,
    context: Map<String, Value>,
    started: Instant,
}

impl ProfileScope {
    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: obj(fields),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = std::mem::take(&mut self.context);
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================
