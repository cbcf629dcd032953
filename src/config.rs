// Device configuration loading, validation, and default generation
use serde::Deserialize;
use std::fs;

use crate::http::MAX_HEADERS;

const HEADER_LIMIT_CEILING: usize = 64;
const MIN_BUFFER_SIZE: usize = 512;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub device: Dev,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct Dev {
    pub logging: bool,
    pub log_level: String,
    pub diagnostics: bool,
    pub max_headers: usize,
    pub buffer_size: usize,
    pub max_request_size: usize,
}

impl Default for Dev {
    fn default() -> Self {
        Dev {
            logging: true,
            log_level: "info".to_string(),
            diagnostics: false,
            max_headers: MAX_HEADERS,
            buffer_size: 8192,
            max_request_size: 65_536,
        }
    }
}

impl Dev {
    pub fn validate(&mut self) -> bool {
        let mut valid = true;

        if crate::log::parse_level(&self.log_level).is_none() {
            crate::log::error(&format!("log_level '{}' is not one of debug, info, warn, error", self.log_level));
            valid = false;
        }
        if self.max_headers == 0 {
            crate::log::warn(&format!("max_headers is 0, using {MAX_HEADERS}"));
            self.max_headers = MAX_HEADERS;
        }
        if self.max_headers > HEADER_LIMIT_CEILING {
            crate::log::warn(&format!(
                "max_headers too large ({}), using {HEADER_LIMIT_CEILING}",
                self.max_headers
            ));
            self.max_headers = HEADER_LIMIT_CEILING;
        }
        if self.buffer_size < MIN_BUFFER_SIZE {
            crate::log::warn(&format!("buffer_size too small ({}), using {MIN_BUFFER_SIZE}", self.buffer_size));
            self.buffer_size = MIN_BUFFER_SIZE;
        }
        if self.max_request_size < self.buffer_size {
            crate::log::warn(&format!(
                "max_request_size ({}) < buffer_size ({}), raising to buffer_size",
                self.max_request_size, self.buffer_size
            ));
            self.max_request_size = self.buffer_size;
        }

        valid
    }
}

fn atomic_write(path: &str, content: &str) -> std::io::Result<()> {
    let tmp = format!("{path}.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_config(p: &str) -> Config {
    let mut cfg = match fs::read_to_string(p) {
        Ok(txt) => match toml::from_str(&txt) {
            Ok(c) => {
                crate::log::info(&format!("Loaded {p}"));
                c
            }
            Err(e) => {
                crate::log::error(&format!("Parse error {p}: {e}"));
                crate::log::warn("Using defaults");
                Config::default()
            }
        },
        Err(_) => {
            let cfg = Config::default();
            if atomic_write(p, &generate_config(&cfg)).is_ok() {
                crate::log::info(&format!("Generated {p}"));
            } else {
                crate::log::warn(&format!("No config at '{p}', using defaults"));
            }
            cfg
        }
    };
    if !cfg.device.validate() {
        crate::log::warn("log_level invalid, using info");
        cfg.device.log_level = "info".to_string();
    }
    cfg
}

pub fn generate_config(cfg: &Config) -> String {
    let mut doc = toml::Table::new();
    let mut dev = toml::Table::new();
    dev.insert("logging".into(), toml::Value::Boolean(cfg.device.logging));
    dev.insert("log_level".into(), toml::Value::String(cfg.device.log_level.clone()));
    dev.insert("diagnostics".into(), toml::Value::Boolean(cfg.device.diagnostics));
    dev.insert("max_headers".into(), toml::Value::Integer(cfg.device.max_headers as i64));
    dev.insert("buffer_size".into(), toml::Value::Integer(cfg.device.buffer_size as i64));
    dev.insert("max_request_size".into(), toml::Value::Integer(cfg.device.max_request_size as i64));
    doc.insert("device".into(), toml::Value::Table(dev));
    match toml::to_string_pretty(&doc) {
        Ok(s) => s,
        Err(e) => {
            crate::log::error(&format!("Config serialization failed: {e}"));
            String::new()
        }
    }
}

pub fn path() -> String {
    let args: Vec<String> = std::env::args().collect();
    args.windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| "device.toml".to_string())
}

/// Request files named on the command line; everything except `--config <path>`.
pub fn inputs() -> Vec<String> {
    let mut out = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        if a == "--config" {
            args.next();
            continue;
        }
        out.push(a);
    }
    out
}
