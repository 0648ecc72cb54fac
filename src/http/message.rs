//! The reassembled HTTP/1.x message model and its builder callback
//! interface.
//!
//! `HttpMessageBuilder` is the capability interface named in the design
//! notes ("callback dispatch... `on_request`/`on_response`/`on_header`/
//! `on_body`"), grounded on the Python original's `InfoHTTP` callback
//! set. `HttpMessage` is its sole implementor — the parser is generic
//! over the trait only to keep the contract explicit, not because more
//! than one implementation is expected.

use serde::Serialize;

/// A fully or partially reassembled HTTP/1.x message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum HttpStartLine {
    Request {
        method: String,
        url: String,
        version: String,
    },
    Response {
        version: String,
        status_code: u16,
        status_text: String,
    },
}

/// An HTTP/1.x request or response, with headers in arrival order
/// (duplicates preserved) and a reassembled body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HttpMessage {
    pub start_line: Option<HttpStartLine>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpMessage {
    pub fn is_request(&self) -> bool {
        matches!(self.start_line, Some(HttpStartLine::Request { .. }))
    }

    /// The `kind` field of the sink callback: the HTTP method for
    /// requests, or the literal `"HTTP Response"` for responses.
    pub fn kind(&self) -> String {
        match &self.start_line {
            Some(HttpStartLine::Request { method, .. }) => method.clone(),
            Some(HttpStartLine::Response { .. }) => "HTTP Response".to_string(),
            None => String::new(),
        }
    }

    /// The `summary` field of the sink callback: the literal
    /// `"HTTP Request"` for requests, or `"<code> <reason>"` for responses.
    pub fn summary(&self) -> String {
        match &self.start_line {
            Some(HttpStartLine::Request { .. }) => "HTTP Request".to_string(),
            Some(HttpStartLine::Response {
                status_code,
                status_text,
                ..
            }) => format!("{status_code} {status_text}"),
            None => String::new(),
        }
    }
}

/// The message-builder capability the parser drives as it consumes bytes.
pub trait HttpMessageBuilder {
    fn on_request(&mut self, method: String, url: String, version: String);
    fn on_response(&mut self, version: String, status_code: u16, status_text: String);
    fn on_header(&mut self, name: String, value: String);
    fn on_body(&mut self, chunk: &[u8]);
}

impl HttpMessageBuilder for HttpMessage {
    fn on_request(&mut self, method: String, url: String, version: String) {
        self.start_line = Some(HttpStartLine::Request {
            method,
            url,
            version,
        });
    }

    fn on_response(&mut self, version: String, status_code: u16, status_text: String) {
        self.start_line = Some(HttpStartLine::Response {
            version,
            status_code,
            status_text,
        });
    }

    fn on_header(&mut self, name: String, value: String) {
        self.headers.push((name, value));
    }

    fn on_body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }
}
