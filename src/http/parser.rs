//! A pull-driven incremental HTTP/1.x message parser.
//!
//! Phases: `Start -> Headers -> Body -> Complete`. Each call to
//! [`HttpParser::feed_data`] appends to an internal [`SplitBuffer`] and
//! advances the state machine as far as the buffered bytes allow,
//! suspending without error at the first point of starvation. Malformed
//! input is reported once, via [`HttpParser::feed_data`]'s `Result`; the
//! caller (the reassembler) is responsible for tearing down the
//! connection on that error.

use crate::error::HttpParseError;
use crate::http::message::{HttpMessage, HttpMessageBuilder};
use crate::http::split_buffer::SplitBuffer;

const CRLF: &[u8] = b"\r\n";

const HTTP_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "TRACE", "CONNECT",
];

/// Returns true if `payload` looks like the start of an HTTP/1.x message:
/// it begins with a recognized method followed by whitespace, or begins
/// with the token `HTTP` (case-insensitive).
pub fn looks_like_http_start(payload: &[u8]) -> bool {
    let first_token_end = payload.iter().position(|b| b.is_ascii_whitespace());
    if let Some(end) = first_token_end {
        if let Ok(token) = std::str::from_utf8(&payload[..end]) {
            if HTTP_METHODS.contains(&token) {
                return true;
            }
        }
    }
    payload.len() >= 4 && payload[..4].eq_ignore_ascii_case(b"http")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Headers,
    Body,
    Complete,
}

/// An incremental HTTP/1.x parser over a single half-stream's bytes.
#[derive(Debug)]
pub struct HttpParser {
    phase: Phase,
    expected_body_len: u64,
    buffer: SplitBuffer,
    message: HttpMessage,
}

impl Default for HttpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpParser {
    pub fn new() -> Self {
        HttpParser {
            phase: Phase::Start,
            expected_body_len: 0,
            buffer: SplitBuffer::new(),
            message: HttpMessage::default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// The message built so far. Only meaningful in full once
    /// [`Self::is_complete`] returns true.
    pub fn message(&self) -> &HttpMessage {
        &self.message
    }

    /// Consume the parser, returning the message it built.
    pub fn into_message(self) -> HttpMessage {
        self.message
    }

    /// Feed newly-arrived, in-order bytes to the parser and advance the
    /// state machine as far as possible. A no-op once complete.
    pub fn feed_data(&mut self, data: &[u8]) -> Result<(), HttpParseError> {
        if self.phase == Phase::Complete {
            return Ok(());
        }
        self.buffer.feed(data);
        self.advance()
    }

    fn advance(&mut self) -> Result<(), HttpParseError> {
        loop {
            match self.phase {
                Phase::Start => {
                    let Some(line) = self.buffer.pop(CRLF) else {
                        return Ok(());
                    };
                    self.parse_start_line(&line)?;
                    self.phase = Phase::Headers;
                }
                Phase::Headers => {
                    let Some(line) = self.buffer.pop(CRLF) else {
                        return Ok(());
                    };
                    if line.is_empty() {
                        self.phase = if self.expected_body_len == 0 {
                            Phase::Complete
                        } else {
                            Phase::Body
                        };
                        if self.phase == Phase::Complete {
                            return Ok(());
                        }
                    } else {
                        self.parse_header_line(&line)?;
                    }
                }
                Phase::Body => {
                    if self.expected_body_len == 0 {
                        self.phase = Phase::Complete;
                        return Ok(());
                    }
                    if self.buffer.is_empty() {
                        return Ok(());
                    }
                    // Surplus beyond expected_body_len is absorbed into the
                    // body rather than precisely truncated; see spec notes
                    // on BODY phase semantics.
                    let chunk = self.buffer.flush();
                    let consumed = chunk.len() as u64;
                    self.message.on_body(&chunk);
                    self.expected_body_len = self.expected_body_len.saturating_sub(consumed);
                    if self.expected_body_len == 0 {
                        self.phase = Phase::Complete;
                        return Ok(());
                    }
                }
                Phase::Complete => return Ok(()),
            }
        }
    }

    fn parse_start_line(&mut self, line: &[u8]) -> Result<(), HttpParseError> {
        let tokens: Vec<&[u8]> = line
            .split(|b| b.is_ascii_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() < 2 {
            return Err(HttpParseError::BadStartLine);
        }

        let first = std::str::from_utf8(tokens[0]).map_err(|_| HttpParseError::BadStartLine)?;
        if HTTP_METHODS.contains(&first) {
            if tokens.len() < 3 {
                return Err(HttpParseError::BadStartLine);
            }
            let method = first.to_string();
            let url = String::from_utf8_lossy(tokens[1]).into_owned();
            let version = String::from_utf8_lossy(tokens[2]).into_owned();
            self.message.on_request(method, url, version);
        } else {
            let version = first.to_string();
            let status_code: u16 = std::str::from_utf8(tokens[1])
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|code| *code <= 999)
                .ok_or(HttpParseError::BadStartLine)?;
            let status_text = tokens[2..]
                .iter()
                .map(|t| String::from_utf8_lossy(t).into_owned())
                .collect::<Vec<_>>()
                .join(" ");
            self.message.on_response(version, status_code, status_text);
        }
        Ok(())
    }

    fn parse_header_line(&mut self, line: &[u8]) -> Result<(), HttpParseError> {
        let pos = find_subslice(line, b": ").ok_or(HttpParseError::BadHeaderLine)?;
        let name = String::from_utf8_lossy(&line[..pos]).into_owned();
        let value = String::from_utf8_lossy(&line[pos + 2..]).into_owned();

        if name.eq_ignore_ascii_case("content-length") {
            self.expected_body_len = value
                .trim()
                .parse()
                .map_err(|_| HttpParseError::BadContentLength)?;
        }

        self.message.on_header(name, value);
        Ok(())
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::message::HttpStartLine;

    #[test]
    fn s1_simple_request() {
        let mut p = HttpParser::new();
        p.feed_data(b"GET /index.html HTTP/1.1\r\nHost: a.example\r\nContent-Length: 0\r\n\r\n")
            .unwrap();
        assert!(p.is_complete());
        let msg = p.into_message();
        assert_eq!(msg.kind(), "GET");
        assert_eq!(msg.summary(), "HTTP Request");
        assert_eq!(
            msg.headers,
            vec![
                ("Host".to_string(), "a.example".to_string()),
                ("Content-Length".to_string(), "0".to_string()),
            ]
        );
        assert_eq!(msg.body, b"");
    }

    #[test]
    fn s2_response_with_body() {
        let mut p = HttpParser::new();
        p.feed_data(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nHELLO")
            .unwrap();
        assert!(p.is_complete());
        let msg = p.into_message();
        assert_eq!(msg.kind(), "HTTP Response");
        assert_eq!(msg.summary(), "200 OK");
        assert_eq!(msg.body, b"HELLO");
    }

    #[test]
    fn s6_fin_terminated_response_without_content_length() {
        let mut p = HttpParser::new();
        p.feed_data(b"HTTP/1.1 200 OK\r\n\r\n").unwrap();
        assert!(p.is_complete());
        assert_eq!(p.message().body, b"");
    }

    #[test]
    fn incremental_feed_across_many_small_chunks() {
        let whole = b"GET / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";
        let mut p = HttpParser::new();
        for byte in whole {
            p.feed_data(&[*byte]).unwrap();
        }
        assert!(p.is_complete());
        assert_eq!(p.into_message().body, b"abc");
    }

    #[test]
    fn surplus_body_bytes_are_absorbed() {
        let mut p = HttpParser::new();
        p.feed_data(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nHELLO")
            .unwrap();
        assert!(p.is_complete());
        assert_eq!(p.into_message().body, b"HELLO");
    }

    #[test]
    fn feed_after_complete_is_a_noop() {
        let mut p = HttpParser::new();
        p.feed_data(b"HTTP/1.1 200 OK\r\n\r\n").unwrap();
        assert!(p.is_complete());
        p.feed_data(b"garbage").unwrap();
        assert_eq!(p.message().body, b"");
    }

    #[test]
    fn malformed_header_line_is_rejected() {
        let mut p = HttpParser::new();
        let err = p.feed_data(b"GET / HTTP/1.1\r\nBadHeader\r\n\r\n").unwrap_err();
        assert_eq!(err, HttpParseError::BadHeaderLine);
    }

    #[test]
    fn non_numeric_content_length_is_rejected() {
        let mut p = HttpParser::new();
        let err = p
            .feed_data(b"GET / HTTP/1.1\r\nContent-Length: abc\r\n\r\n")
            .unwrap_err();
        assert_eq!(err, HttpParseError::BadContentLength);
    }

    #[test]
    fn start_line_with_one_token_is_rejected() {
        let mut p = HttpParser::new();
        let err = p.feed_data(b"GET\r\n").unwrap_err();
        assert_eq!(err, HttpParseError::BadStartLine);
    }

    #[test]
    fn status_code_above_999_is_rejected() {
        let mut p = HttpParser::new();
        let err = p.feed_data(b"HTTP/1.1 1000 X\r\n").unwrap_err();
        assert_eq!(err, HttpParseError::BadStartLine);
    }

    #[test]
    fn response_status_text_joins_remaining_tokens() {
        let mut p = HttpParser::new();
        p.feed_data(b"HTTP/1.1 404 Not Found\r\n\r\n").unwrap();
        match p.message().start_line.as_ref().unwrap() {
            HttpStartLine::Response {
                status_code,
                status_text,
                ..
            } => {
                assert_eq!(*status_code, 404);
                assert_eq!(status_text, "Not Found");
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn looks_like_http_start_recognizes_methods_and_http_token() {
        assert!(looks_like_http_start(b"GET / HTTP/1.1\r\n"));
        assert!(looks_like_http_start(b"POST /submit HTTP/1.1\r\n"));
        assert!(looks_like_http_start(b"HTTP/1.1 200 OK\r\n"));
        assert!(looks_like_http_start(b"http/1.1 200 OK\r\n"));
        assert!(!looks_like_http_start(b"\x01\x02\x03random binary"));
        assert!(!looks_like_http_start(b""));
    }
}
