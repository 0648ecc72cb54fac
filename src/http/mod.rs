//! The split-line buffer, message model, and incremental HTTP/1.x parser.

pub mod message;
pub mod parser;
pub mod split_buffer;

pub use message::{HttpMessage, HttpMessageBuilder, HttpStartLine};
pub use parser::{looks_like_http_start, HttpParser};
pub use split_buffer::SplitBuffer;
