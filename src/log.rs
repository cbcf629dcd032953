// Centralized logging with timestamps, log levels and the parser diagnostics sink
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::SystemTime;

use crate::colors::*;
use crate::http::{ParsedRequest, Trace};

static ENABLED: AtomicBool = AtomicBool::new(true);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LEVEL_INFO);

const LEVEL_DEBUG: u8 = 0;
const LEVEL_INFO: u8 = 1;
const LEVEL_WARN: u8 = 2;
const LEVEL_ERROR: u8 = 3;

pub fn init(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

/// Parse a level name. Unknown names yield `None`.
pub fn parse_level(level: &str) -> Option<u8> {
    match level.to_lowercase().as_str() {
        "debug" => Some(LEVEL_DEBUG),
        "info" => Some(LEVEL_INFO),
        "warn" | "warning" => Some(LEVEL_WARN),
        "error" => Some(LEVEL_ERROR),
        _ => None,
    }
}

pub fn set_level(level: &str) {
    LOG_LEVEL.store(parse_level(level).unwrap_or(LEVEL_INFO), Ordering::Relaxed);
}

fn active() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

fn above_level(level: u8) -> bool {
    level >= LOG_LEVEL.load(Ordering::Relaxed)
}

fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = now.as_secs();
    let (h, m, s) = ((secs % 86400) / 3600, (secs % 3600) / 60, secs % 60);
    let (year, month, day) = days_to_ymd(secs / 86400);
    format!("{year:04}-{month:02}-{day:02} {h:02}:{m:02}:{s:02}.{:03}", now.subsec_millis())
}

/// Convert days since epoch to (year, month, day)
fn days_to_ymd(days: u64) -> (u64, u64, u64) {
    let mut y = 1970;
    let mut remaining = days;
    loop {
        let len = if is_leap(y) { 366 } else { 365 };
        if remaining < len { break; }
        remaining -= len;
        y += 1;
    }
    let feb = if is_leap(y) { 29 } else { 28 };
    let mut mo = 1;
    for dm in [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31] {
        if remaining < dm { break; }
        remaining -= dm;
        mo += 1;
    }
    (y, mo, remaining + 1)
}

fn is_leap(y: u64) -> bool {
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}

pub fn debug(msg: &str) {
    if !active() || !above_level(LEVEL_DEBUG) { return; }
    let ts = timestamp();
    let _ = writeln!(io::stdout(), "{DIM}{ts}{RESET} {DIM}DBG{RESET} {msg}");
    let _ = io::stdout().flush();
}

pub fn info(msg: &str) {
    if !active() || !above_level(LEVEL_INFO) { return; }
    let ts = timestamp();
    let _ = writeln!(io::stdout(), "{DIM}{ts}{RESET} {BOLD}{CYAN}{msg}{RESET}");
    let _ = io::stdout().flush();
}

pub fn warn(msg: &str) {
    if !active() || !above_level(LEVEL_WARN) { return; }
    let ts = timestamp();
    let _ = writeln!(io::stderr(), "{DIM}{ts}{RESET} {YELLOW}⚠ {msg}{RESET}");
    let _ = io::stderr().flush();
}

pub fn error(msg: &str) {
    if !active() { return; }
    let ts = timestamp();
    let _ = writeln!(io::stderr(), "{DIM}{ts}{RESET} {RED}✗ {msg}{RESET}");
    let _ = io::stderr().flush();
}

/// Parser trace lines. Emitted whenever a `Diagnostics` sink is attached,
/// independent of the configured level.
fn diag(msg: &str) {
    if !active() { return; }
    let ts = timestamp();
    let mut out = io::stdout().lock();
    for line in msg.lines() {
        let _ = writeln!(out, "{DIM}{ts} DIAG{RESET} {line}");
    }
    let _ = out.flush();
}

/// Diagnostics sink that routes parser trace output through this logger.
pub struct Diagnostics;

impl Trace for Diagnostics {
    fn trace(&self, msg: &str) {
        diag(msg);
    }
}

pub fn parsed(source: &str, req: &ParsedRequest) {
    if !active() || !above_level(LEVEL_INFO) { return; }
    let ts = timestamp();
    let m = req.method();
    let col = method_color(m);
    let (major, minor) = req.version();
    let _ = writeln!(
        io::stdout(),
        "{DIM}{ts}{RESET} {YELLOW}→{RESET} {BOLD}{col}{m}{RESET} {} HTTP/{major}.{minor} \
         {DIM}({} headers, {} body bytes) from {source}{RESET}",
        req.path(),
        req.headers().len(),
        req.body().len(),
    );
    let _ = io::stdout().flush();
    for h in req.headers() {
        debug(&format!("  {h}"));
    }
}

pub fn separator() {
    if !active() { return; }
    let _ = writeln!(io::stdout(), "{SEPARATOR}");
    let _ = io::stdout().flush();
}
