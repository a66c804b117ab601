//! HTTP exchange logger
//!
//! Appends a summary of every search and page fetch to
//! `.spyglass/http_requests.log` when `SPYGLASS_HTTP_LOG` is `1`, `true`,
//! `yes` or `on`. Off by default.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chrono::Local;
use tracing::warn;

const ENV_HTTP_LOG: &str = "SPYGLASS_HTTP_LOG";

const LOG_DIR: &str = ".spyglass";
const LOG_FILE_NAME: &str = "http_requests.log";

/// Bodies above this many bytes are truncated in the log
const MAX_BODY_SIZE: usize = 10000;

const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "set-cookie",
    "cookie",
    "x-api-key",
    "x-auth-token",
    "proxy-authorization",
];

static LOG_MUTEX: Mutex<()> = Mutex::new(());

pub fn is_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var(ENV_HTTP_LOG)
            .map(|v| {
                let v = v.trim().to_lowercase();
                v == "1" || v == "true" || v == "yes" || v == "on"
            })
            .unwrap_or(false)
    })
}

/// One request with either its response or the transport error
#[derive(Debug, Clone)]
pub struct HttpExchangeLog {
    pub method: String,
    pub url: String,
    pub duration_ms: u64,
    pub status: Option<u16>,
    pub response_headers: Vec<(String, String)>,
    pub response_body: Option<String>,
    pub error: Option<String>,
}

impl HttpExchangeLog {
    pub fn completed(
        method: &str,
        url: &str,
        duration_ms: u64,
        status: u16,
        response_headers: Vec<(String, String)>,
        body: &str,
    ) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            duration_ms,
            status: Some(status),
            response_headers,
            response_body: is_enabled().then(|| body.to_string()),
            error: None,
        }
    }

    pub fn failed(
        method: &str,
        url: &str,
        duration_ms: u64,
        error: &dyn std::fmt::Display,
    ) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            duration_ms,
            status: None,
            response_headers: Vec::new(),
            response_body: None,
            error: Some(error.to_string()),
        }
    }

    /// Log entry text, without the surrounding timestamp banner
    pub fn render(&self) -> String {
        let mut out = String::new();

        match self.status {
            Some(status) => {
                out.push_str(&format!("\n--- Response ({}ms) ---\n", self.duration_ms));
                out.push_str(&format!("Status: {}\n", status));

                out.push_str("\n--- Response Headers ---\n");
                for (name, value) in &self.response_headers {
                    out.push_str(&format!("{}: {}\n", name, mask_sensitive_header(name, value)));
                }

                if let Some(body) = &self.response_body {
                    out.push_str("\n--- Response Body ---\n");
                    out.push_str(&truncate_utf8_safe(body, MAX_BODY_SIZE));
                    out.push('\n');
                }
            }
            None => {
                out.push_str(&format!("\n--- Error ({}ms) ---\n", self.duration_ms));
                out.push_str(self.error.as_deref().unwrap_or("unknown error"));
                out.push('\n');
            }
        }

        out
    }
}

pub fn log_exchange(entry: &HttpExchangeLog) {
    if !is_enabled() {
        return;
    }

    let separator = "=".repeat(80);
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let content = format!(
        "\n{sep}\n[{ts}] {} {}\n{sep}\n{}\n{sep}\n",
        entry.method,
        entry.url,
        entry.render(),
        sep = separator,
        ts = timestamp,
    );

    if let Err(e) = write_log(&log_file_path(Path::new(".")), &content) {
        warn!("Failed to write HTTP log: {}", e);
    }
}

pub fn log_file_path(root: &Path) -> PathBuf {
    let dir = root.join(LOG_DIR);
    if !dir.exists() {
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Failed to create {} directory: {}", LOG_DIR, e);
        }
    }
    dir.join(LOG_FILE_NAME)
}

pub fn write_log(path: &Path, content: &str) -> std::io::Result<()> {
    let _guard = LOG_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn is_sensitive_header(name: &str) -> bool {
    let name_lower = name.to_lowercase();
    SENSITIVE_HEADERS.iter().any(|h| name_lower == *h)
}

pub fn mask_sensitive_header(name: &str, value: &str) -> String {
    if is_sensitive_header(name) {
        mask_token(value)
    } else {
        value.to_string()
    }
}

/// Keep the first and last four characters of long secrets
pub fn mask_token(value: &str) -> String {
    let (prefix, secret) = match value.strip_prefix("Bearer ") {
        Some(token) => ("Bearer ", token),
        None => ("", value),
    };

    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}...{}", prefix, head, tail)
    } else {
        format!("{}****", prefix)
    }
}

/// Truncate at a UTF-8 character boundary
pub fn truncate_utf8_safe(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...\n[truncated, total {} bytes]", &s[..end], s.len())
}

pub fn extract_response_headers(response: &reqwest::Response) -> Vec<(String, String)> {
    if !is_enabled() {
        return Vec::new();
    }

    response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect()
}
