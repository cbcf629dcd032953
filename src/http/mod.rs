// HTTP request parsing and input assembly
mod request;
pub use request::ParsedRequest;

use std::fmt;
use std::io::Read;

use bytes::BytesMut;

use crate::config::Dev;

/// Default cap on retained header lines.
pub const MAX_HEADERS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Head,
    Invalid,
}

impl Method {
    /// Classify a method token by prefix, ignoring case.
    ///
    /// Deliberately loose: any token starting with `g` is a GET, `pu` a PUT,
    /// and so on.
    pub fn classify(token: &str) -> Self {
        let t = token.to_ascii_lowercase();
        if t.starts_with('g') {
            Method::Get
        } else if t.starts_with("pu") {
            Method::Put
        } else if t.starts_with("po") {
            Method::Post
        } else if t.starts_with('d') {
            Method::Delete
        } else if t.starts_with('h') {
            Method::Head
        } else {
            Method::Invalid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Invalid => "INVALID",
        }
    }

    pub fn to_http(self) -> Option<http::Method> {
        match self {
            Method::Get => Some(http::Method::GET),
            Method::Put => Some(http::Method::PUT),
            Method::Post => Some(http::Method::POST),
            Method::Delete => Some(http::Method::DELETE),
            Method::Head => Some(http::Method::HEAD),
            Method::Invalid => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line-oriented sink for parser diagnostics.
pub trait Trace {
    fn trace(&self, msg: &str);
}

impl<F: Fn(&str)> Trace for F {
    fn trace(&self, msg: &str) {
        self(msg)
    }
}

/// Locate the first blank line. Returns the offset of the `\n` ending the
/// previous line and the length of the separator (`\n\n` or `\n\r\n`).
pub fn find_blank_line(d: &[u8]) -> Option<(usize, usize)> {
    for i in 0..d.len() {
        if d[i] != b'\n' { continue; }
        match d.get(i + 1) {
            Some(b'\n') => return Some((i, 2)),
            Some(b'\r') if d.get(i + 2) == Some(&b'\n') => return Some((i, 3)),
            _ => {}
        }
    }
    None
}

/// First value for `n` among raw `Name: value` lines, case-insensitive.
pub fn get_hdr<'a>(lines: &'a [String], n: &str) -> Option<&'a str> {
    for l in lines {
        if let Some((k, v)) = l.split_once(':') {
            if k.trim().eq_ignore_ascii_case(n) { return Some(v.trim()); }
        }
    }
    None
}

pub enum ReadResult {
    Ok(ParsedRequest),
    TimedOut,
    Error(String),
}

/// Length of `b` without an incomplete UTF-8 sequence at its end.
fn complete_utf8_len(b: &[u8]) -> usize {
    let from = b.len().saturating_sub(3);
    for i in (from..b.len()).rev() {
        let need = match b[i] {
            0x80..=0xBF => continue,
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return b.len(),
        };
        return if b.len() - i < need { i } else { b.len() };
    }
    b.len()
}

/// Read one request from `r`. The head (everything up to and including the
/// blank line) is parsed as a single buffer; bytes read after that are
/// collected and appended to the body once the stream ends.
pub fn read_request(r: &mut impl Read, dev: &Dev, trace: Option<&dyn Trace>) -> ReadResult {
    let mut head = BytesMut::with_capacity(dev.buffer_size);
    let mut chunk = vec![0u8; dev.buffer_size];
    let mut timed_out = false;
    let mut eof = false;

    loop {
        match r.read(&mut chunk) {
            Ok(0) => {
                eof = true;
                break;
            }
            Ok(n) => {
                // A separator may straddle the previous read.
                let scan_from = head.len().saturating_sub(2);
                head.extend_from_slice(&chunk[..n]);
                if head.len() > dev.max_request_size {
                    return ReadResult::Error("request too large".into());
                }
                if find_blank_line(&head[scan_from..]).is_some() {
                    break;
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut
                       || e.kind() == std::io::ErrorKind::WouldBlock => {
                timed_out = true;
                break;
            }
            Err(e) => return ReadResult::Error(e.to_string()),
        }
    }

    if head.is_empty() {
        return if timed_out { ReadResult::TimedOut } else { ReadResult::Error("connection closed".into()) };
    }
    if timed_out || eof {
        return ReadResult::Ok(ParsedRequest::from_bytes(&head, dev.max_headers, trace));
    }

    // Hold back a character cut off by the read boundary; it is completed
    // by the rest of the body.
    let mut total = head.len();
    let mut body = head.split_off(complete_utf8_len(&head));
    let mut req = ParsedRequest::from_bytes(&head, dev.max_headers, trace);

    loop {
        match r.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                total += n;
                if total > dev.max_request_size {
                    return ReadResult::Error("request too large".into());
                }
                body.extend_from_slice(&chunk[..n]);
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut
                       || e.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(e) => return ReadResult::Error(e.to_string()),
        }
    }
    if !body.is_empty() {
        req.append_body(&String::from_utf8_lossy(&body));
    }
    ReadResult::Ok(req)
}
