use crate::filters::EntitlementContext;
use crate::security::Principal;
use http::Method;
use may_minihttp::Request;
use smallvec::SmallVec;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;
use ulid::Ulid;

/// Most requests carry fewer headers than this; larger sets spill to the heap.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header (or cookie) name/value pairs.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Case-insensitive header lookup.
pub fn find_header<'a>(headers: &'a HeaderVec, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Request as seen by the login service, filters and API resources.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    /// Raw query string (without `?`), empty when absent.
    pub query: String,
    /// Headers with lowercase names.
    pub headers: HeaderVec,
    pub cookies: HeaderVec,
    pub body: Vec<u8>,
    /// Set by the request tagging filter.
    pub request_id: Option<Ulid>,
    /// Set by the login service.
    pub principal: Option<Principal>,
    /// Set by the entitlement context filter.
    pub entitlement: Option<EntitlementContext>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p.to_string(), q.to_string()),
            None => (path, String::new()),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderVec::new(),
            cookies: HeaderVec::new(),
            body: Vec::new(),
            request_id: None,
            principal: None,
            entitlement: None,
        }
    }

    /// Add a header, keeping cookies in sync when it is a `Cookie` header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if name == "cookie" {
            self.cookies.extend(parse_cookies(&value));
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON, if it is JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    /// Best-effort client address, taken from proxy headers.
    pub fn source_address(&self) -> &str {
        self.get_header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("unknown")
    }
}

/// Split a `Cookie` header value into name/value pairs.
pub fn parse_cookies(header: &str) -> HeaderVec {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim().to_string();
            Some((Arc::from(name), value))
        })
        .collect()
}

/// Convert a `may_minihttp::Request` into an [`ApiRequest`].
///
/// Returns `None` when the method is not a valid HTTP token.
pub fn parse_request(req: Request) -> Option<ApiRequest> {
    let method = Method::from_bytes(req.method().as_bytes()).ok()?;
    let mut parsed = ApiRequest::new(method, req.path());

    for h in req.headers().iter() {
        parsed.headers.push((
            Arc::from(h.name.to_ascii_lowercase()),
            String::from_utf8_lossy(h.value).to_string(),
        ));
    }
    if let Some(cookie) = find_header(&parsed.headers, "cookie") {
        parsed.cookies = parse_cookies(cookie);
    }

    let mut body = Vec::new();
    if let Err(e) = req.body().read_to_end(&mut body) {
        debug!(error = %e, "Request body could not be read");
        body.clear();
    }
    parsed.body = body;

    debug!(
        method = %parsed.method,
        path = %parsed.path,
        header_count = parsed.headers.len(),
        cookie_count = parsed.cookies.len(),
        body_bytes = parsed.body.len(),
        "HTTP request parsed"
    );
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies("a=b; c=d; ;e");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[0].1, "b");
        assert_eq!(cookies[1].1, "d");
        assert_eq!(cookies[2].1, "");
    }

    #[test]
    fn test_query_split_and_lookup() {
        let req = ApiRequest::new(Method::GET, "/v1/server/up?verbose=1")
            .with_header("X-Forwarded-For", "10.0.0.1, 10.0.0.2")
            .with_header("Cookie", "X-CSRF-TOKEN=abc");
        assert_eq!(req.path, "/v1/server/up");
        assert_eq!(req.query, "verbose=1");
        assert_eq!(req.get_header("x-forwarded-for"), Some("10.0.0.1, 10.0.0.2"));
        assert_eq!(req.source_address(), "10.0.0.1");
        assert_eq!(req.get_cookie("X-CSRF-TOKEN"), Some("abc"));
    }
}
