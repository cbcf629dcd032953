mod colors;
mod config;
mod http;
mod log;


use std::io::Read;

use ::http::header::CONTENT_LENGTH;

use crate::config::Dev;
use crate::http::{ReadResult, Trace};

fn inspect(source: &str, r: &mut impl Read, dev: &Dev, trace: Option<&dyn Trace>) -> bool {
    match http::read_request(r, dev, trace) {
        ReadResult::Ok(req) => {
            log::parsed(source, &req);
            if !req.is_valid() {
                log::warn(&format!("{source}: request line could not be parsed"));
                return false;
            }
            if req.http_version().is_none() {
                let (major, minor) = req.version();
                log::warn(&format!("{source}: unrecognised HTTP version {major}.{minor}"));
            }
            let declared = req.header_map().get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok()?.parse::<usize>().ok());
            if let Some(n) = declared.filter(|&n| n != req.body().len()) {
                log::warn(&format!("{source}: Content-Length {n}, body has {} bytes", req.body().len()));
            }
            if let Some(m) = req.method().to_http() {
                log::debug(&format!("{source}: {m} for host {}", req.header("Host").unwrap_or("-")));
            }
            true
        }
        ReadResult::TimedOut => {
            log::warn(&format!("{source}: timed out before any data"));
            false
        }
        ReadResult::Error(e) => {
            log::error(&format!("{source}: {e}"));
            false
        }
    }
}

fn main() {
    let c = config::load_config(&config::path());
    log::init(c.device.logging);
    log::set_level(&c.device.log_level);
    log::debug(&format!(
        "max_headers={} buffer_size={} max_request_size={}",
        c.device.max_headers, c.device.buffer_size, c.device.max_request_size
    ));
    log::separator();

    let diagnostics = log::Diagnostics;
    let trace = c.device.diagnostics.then_some(&diagnostics as &dyn Trace);

    let inputs = config::inputs();
    let mut ok = true;
    if inputs.is_empty() {
        ok &= inspect("stdin", &mut std::io::stdin().lock(), &c.device, trace);
    }
    for p in &inputs {
        match std::fs::File::open(p) {
            Ok(mut f) => ok &= inspect(p, &mut f, &c.device, trace),
            Err(e) => {
                log::error(&format!("Cannot open {p}: {e}"));
                ok = false;
            }
        }
    }
    log::separator();
    if !ok {
        std::process::exit(1);
    }
}
