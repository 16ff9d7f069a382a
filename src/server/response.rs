use std::collections::HashMap;
use std::sync::Arc;

use may_minihttp::Response;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::Value;

use super::request::{find_header, HeaderVec};

/// Response produced by the login service, filters, static content or API resources.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl HandlerResponse {
    pub fn new(status: u16, headers: HeaderVec, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON body with `Content-Type: application/json`.
    pub fn json(status: u16, body: Value) -> Self {
        Self::bytes(status, "application/json", body.to_string().into_bytes())
    }

    pub fn bytes(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        let mut res = Self::new(status, HeaderVec::new(), body);
        res.set_header("Content-Type", content_type);
        res
    }

    pub fn empty(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Vec::new())
    }

    /// `{"error": message}` with the given status.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, serde_json::json!({ "error": message.into() }))
    }

    /// Replace any existing header with the same (case-insensitive) name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            slot.1 = value;
        } else {
            self.headers.push((Arc::from(name), value));
        }
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

pub(crate) fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

// may_minihttp only accepts `&'static str` header lines. Every header the launcher emits
// comes from a bounded set (content types, cache policy, CORS, the per-server CSRF cookie,
// the login realm), so each distinct line is leaked exactly once.
static HEADER_LINES: Lazy<Mutex<HashMap<String, &'static str>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn header_line(name: &str, value: &str) -> &'static str {
    let line = format!("{name}: {value}");
    let mut lines = HEADER_LINES.lock();
    if let Some(existing) = lines.get(&line) {
        return existing;
    }
    let leaked: &'static str = Box::leak(line.clone().into_boxed_str());
    lines.insert(line, leaked);
    leaked
}

/// Write a [`HandlerResponse`] into the engine response.
pub fn write_response(res: &mut Response, response: HandlerResponse) {
    res.status_code(response.status as usize, status_reason(response.status));
    for (name, value) in response.headers.iter() {
        res.header(header_line(name, value));
    }
    res.body_vec(response.body);
}
