//! Glue threading one raw Ethernet frame through the decoders and into
//! the reassembler. Holds no state beyond the reassembler and a
//! monotonic clock for message timestamps.

use std::time::Instant;

use tracing::debug;

use crate::decode::{self, ethernet, tcp, NetHeader, PROTO_TCP};
use crate::error::DecodeError;
use crate::http::HttpMessage;
use crate::reassembly::{ConnectionKey, Reassembler, SegmentOutcome};

/// One fully reassembled HTTP message, stamped with seconds since the
/// dispatcher was constructed (spec's "seconds since pipeline start").
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampedMessage {
    pub timestamp_seconds: f64,
    pub src_ip: std::net::IpAddr,
    pub dst_ip: std::net::IpAddr,
    pub message: HttpMessage,
}

/// Threads frames through Ethernet -> IP -> TCP -> reassembly.
pub struct Dispatcher {
    reassembler: Reassembler,
    start: Instant,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            reassembler: Reassembler::new(),
            start: Instant::now(),
        }
    }

    /// Decode and reassemble one raw Ethernet frame. Returns `Some` only
    /// when an HTTP message was completed by this frame; malformed or
    /// uninteresting frames return `None` after being dropped/logged.
    pub fn dispatch_frame(&mut self, raw: &[u8]) -> Option<TimestampedMessage> {
        let frame = match ethernet::decode(raw) {
            Ok(f) => f,
            Err(e) => {
                debug!(error = %e, "dropping frame: ethernet decode failed");
                return None;
            }
        };

        let net = match decode::decode_network(frame.ethertype, frame.payload) {
            Ok(n) => n,
            Err(DecodeError::UnsupportedEthertype) => return None,
            Err(e) => {
                debug!(error = %e, "dropping frame: network decode failed");
                return None;
            }
        };

        if net.protocol() != PROTO_TCP {
            return None;
        }

        let segment = match tcp::decode(net.payload()) {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, "dropping frame: tcp decode failed");
                return None;
            }
        };

        self.dispatch_segment(&net, &segment)
    }

    fn dispatch_segment(
        &mut self,
        net: &NetHeader<'_>,
        segment: &tcp::TcpSegment<'_>,
    ) -> Option<TimestampedMessage> {
        let key = ConnectionKey {
            src_ip: net.src_ip(),
            dst_ip: net.dst_ip(),
            src_port: segment.src_port,
            dst_port: segment.dst_port,
        };

        match self.reassembler.on_segment(
            key,
            segment.seq,
            segment.flags.fin,
            segment.payload,
        ) {
            SegmentOutcome::Completed(message) => Some(TimestampedMessage {
                timestamp_seconds: self.start.elapsed().as_secs_f64(),
                src_ip: key.src_ip,
                dst_ip: key.dst_ip,
                message,
            }),
            SegmentOutcome::Malformed(e) => {
                debug!(error = %e, "connection torn down: malformed HTTP");
                None
            }
            SegmentOutcome::Pending | SegmentOutcome::Ignored => None,
        }
    }

    /// Number of half-streams currently buffered. Exposed for tests and
    /// diagnostics.
    pub fn active_connections(&self) -> usize {
        self.reassembler.active_connections()
    }
}
