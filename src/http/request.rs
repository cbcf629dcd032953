// Best-effort HTTP request parsing over a single, possibly truncated buffer
use std::fmt;

use http::header::{HeaderMap, HeaderName, HeaderValue};

use super::{find_blank_line, get_hdr, Method, Trace, MAX_HEADERS};

/// Longest accepted method token is one byte shorter than this.
const METHOD_END_LIMIT: usize = 8;
/// Width of the version slice, `HTTP/X.Y`.
const VERSION_WIDTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    method: Method,
    path: String,
    version_major: u8,
    version_minor: u8,
    headers: Vec<String>,
    body: String,
}

impl Default for ParsedRequest {
    fn default() -> Self {
        ParsedRequest {
            method: Method::Invalid,
            path: "/".to_string(),
            version_major: 1,
            version_minor: 0,
            headers: Vec::new(),
            body: String::new(),
        }
    }
}

fn note(trace: Option<&dyn Trace>, msg: fmt::Arguments<'_>) {
    if let Some(t) = trace {
        t.trace(&msg.to_string());
    }
}

fn digit_at(b: &[u8], i: usize) -> u8 {
    match b.get(i) {
        Some(c) if c.is_ascii_digit() => c - b'0',
        _ => 0,
    }
}

impl ParsedRequest {
    /// Parse with the default header cap.
    pub fn parse(input: &str, trace: Option<&dyn Trace>) -> Self {
        Self::parse_with_limit(input, MAX_HEADERS, trace)
    }

    /// Parse raw bytes, decoding invalid UTF-8 lossily.
    pub fn from_bytes(input: &[u8], max_headers: usize, trace: Option<&dyn Trace>) -> Self {
        Self::parse_with_limit(&String::from_utf8_lossy(input), max_headers, trace)
    }

    /// Parse `input`, keeping at most `max_headers` header lines.
    ///
    /// Never fails. Each stage (method, path, version, headers, body) runs
    /// only if the previous one succeeded; an aborted parse leaves the
    /// remaining fields at their defaults.
    pub fn parse_with_limit(input: &str, max_headers: usize, trace: Option<&dyn Trace>) -> Self {
        let mut req = ParsedRequest::default();

        let method_end = match input.find(' ') {
            Some(i) if (1..METHOD_END_LIMIT).contains(&i) => i,
            other => {
                note(trace, format_args!("method delimiter out of range: {other:?}"));
                return req;
            }
        };
        let token = &input[..method_end];
        let method = Method::classify(token);
        if method == Method::Invalid {
            note(trace, format_args!("unrecognised method token '{token}'"));
            return req;
        }
        req.method = method;

        let rest = &input[method_end + 1..];
        let Some(path_end) = rest.find(' ') else {
            note(trace, format_args!("no delimiter after path"));
            return req;
        };
        req.path = rest[..path_end].to_string();

        let rest = &rest[path_end + 1..];
        let raw = rest.as_bytes();
        let version = &raw[..raw.len().min(VERSION_WIDTH)];
        if !version.starts_with(b"HTTP") {
            note(trace, format_args!(
                "version not HTTP/X.Y: '{}'",
                String::from_utf8_lossy(version)
            ));
            return req;
        }
        let major_at = version.iter().position(|&b| b == b'/').map_or(0, |i| i + 1);
        req.version_major = digit_at(version, major_at);
        req.version_minor = digit_at(version, major_at + 2);
        note(trace, format_args!(
            "HTTP request parsed. Method: {}\n\tPath: {}\n\tVersion: {}.{}",
            req.method, req.path, req.version_major, req.version_minor
        ));

        let Some(line_end) = rest.find('\n') else {
            note(trace, format_args!("request line not terminated, no headers"));
            return req;
        };
        // Keep the request line's newline so a blank line directly after it
        // is seen as the header/body boundary.
        let tail = &rest[line_end..];
        let (block, body) = match find_blank_line(tail.as_bytes()) {
            Some((at, sep)) => {
                let block = if at == 0 { "" } else { &tail[1..at] };
                let body = &tail[at + sep..];
                (block, (!body.is_empty()).then_some(body))
            }
            None => (&tail[1..], None),
        };

        note(trace, format_args!("Parsing headers..."));
        let mut remaining = block;
        while !remaining.is_empty() && req.headers.len() < max_headers {
            let (line, next) = match remaining.find('\n') {
                Some(i) => (&remaining[..i], &remaining[i + 1..]),
                None => (remaining, ""),
            };
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() { break; }
            req.headers.push(line.to_string());
            remaining = next;
        }
        if !remaining.is_empty() && req.headers.len() >= max_headers {
            note(trace, format_args!(
                "header limit ({max_headers}) reached, dropped:\n{remaining}"
            ));
        } else if remaining.len() > 1 {
            note(trace, format_args!("Warning, unparsed headers ignored:\n{remaining}"));
        }

        if let Some(b) = body {
            req.body.push_str(b);
        }
        note(trace, format_args!("\tHeaders length: {}", req.headers.len()));
        note(trace, format_args!("\tBody length: {}", req.body.len()));
        req
    }

    /// Append payload delivered after the head was parsed.
    pub fn append_body(&mut self, more: &str) {
        self.body.push_str(more);
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn is_valid(&self) -> bool {
        self.method != Method::Invalid
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> (u8, u8) {
        (self.version_major, self.version_minor)
    }

    pub fn http_version(&self) -> Option<http::Version> {
        match self.version() {
            (0, 9) => Some(http::Version::HTTP_09),
            (1, 0) => Some(http::Version::HTTP_10),
            (1, 1) => Some(http::Version::HTTP_11),
            (2, 0) => Some(http::Version::HTTP_2),
            (3, 0) => Some(http::Version::HTTP_3),
            _ => None,
        }
    }

    /// Raw header lines in arrival order, unsplit. A trailing `\r` from a
    /// CRLF line ending is removed; nothing else is altered.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        get_hdr(&self.headers, name)
    }

    /// Header lines as a `HeaderMap`. Lines that are not a valid
    /// `Name: value` pair are left out.
    pub fn header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for line in &self.headers {
            let Some((k, v)) = line.split_once(':') else { continue };
            let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(k.trim().as_bytes()),
                HeaderValue::from_str(v.trim()),
            ) else {
                continue;
            };
            map.append(name, value);
        }
        map
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
