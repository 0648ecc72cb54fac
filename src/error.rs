//! Error types for every layer of the decode/reassembly/parse pipeline.
//!
//! Each enum maps one-to-one onto a failure domain: malformed bytes at a
//! given protocol layer never propagate past that layer (see
//! [`crate::dispatch::Dispatcher`]), so these types exist mostly for
//! logging and for unit tests that assert on the exact failure kind.

use thiserror::Error;

/// Failure decoding a single binary frame/header at some protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Ethernet frame shorter than the 14-byte fixed header.
    #[error("frame shorter than 14-byte Ethernet header")]
    ShortFrame,

    /// IPv4/IPv6/TCP header shorter than its minimum fixed size.
    #[error("header shorter than minimum for this layer")]
    ShortHeader,

    /// IPv4 version nibble was not 4.
    #[error("IPv4 header version field is not 4")]
    BadVersion,

    /// IPv4 IHL out of the valid [20, 60] range, or exceeds the buffer.
    #[error("IPv4 IHL out of range or exceeds buffer length")]
    BadIhl,

    /// TCP data offset out of the valid [20, 60] range, or exceeds the buffer.
    #[error("TCP data offset out of range or exceeds buffer length")]
    BadDataOffset,

    /// Ethertype other than IPv4 (0x0800) or IPv6 (0x86DD).
    #[error("unsupported ethertype")]
    UnsupportedEthertype,

    /// Network-layer protocol other than TCP (6).
    #[error("unsupported transport protocol")]
    UnsupportedProtocol,
}

/// Failure parsing HTTP/1.x bytes already delivered in sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpParseError {
    /// Start line had fewer than two whitespace-separated tokens.
    #[error("start line has fewer than two tokens")]
    BadStartLine,

    /// Header line had no `": "` separator.
    #[error("header line missing ': ' separator")]
    BadHeaderLine,

    /// `Content-Length` value was not a valid unsigned integer.
    #[error("Content-Length value is not a valid integer")]
    BadContentLength,
}

/// Terminal error from a [`crate::capture::FrameSource`].
///
/// A capture thread exits its loop on receipt of this error; it is never
/// surfaced to the sink callback (spec'd propagation policy: only
/// `SourceFatal` and the stop flag terminate a capture thread).
#[derive(Debug, Error)]
#[error("frame source failed: {0}")]
pub struct SourceFatal(#[from] pub anyhow::Error);
