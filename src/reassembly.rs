//! Per-connection TCP stream reassembly feeding an incremental HTTP parser.
//!
//! Grounded on `original_source/sniffer/sniffer.py`'s `Sniffer`: one map
//! from a 4-tuple half-stream key to per-connection state, a min-heap of
//! out-of-order segments, lazy admission gated on "looks like HTTP", and
//! retransmission/drain handling in `process_tcp_packet`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::net::IpAddr;

use crate::error::HttpParseError;
use crate::http::{looks_like_http_start, HttpMessage, HttpParser};

/// Identifies one half-stream: bytes flowing from `src` to `dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
}

/// A buffered out-of-order segment, ordered by sequence number for the
/// min-heap (`BinaryHeap` is a max-heap, so entries are wrapped in
/// `Reverse`).
#[derive(Debug, Clone, PartialEq, Eq)]
struct BufferedSegment {
    seq: u32,
    payload: Vec<u8>,
}

impl PartialOrd for BufferedSegment {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BufferedSegment {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.seq.cmp(&other.seq)
    }
}

/// Per-half-stream reassembly state.
struct ConnectionState {
    next_seq: u32,
    ooo_buffer: BinaryHeap<Reverse<BufferedSegment>>,
    parser: HttpParser,
}

/// The outcome of admitting or feeding one TCP segment to the reassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// No connection was admitted or advanced (non-HTTP start, or a
    /// zero-effect retransmission/no-op).
    Ignored,
    /// The half-stream's parser made progress but has not completed.
    Pending,
    /// The half-stream's HTTP parser completed; the message is emitted
    /// and the connection entry is removed.
    Completed(HttpMessage),
    /// The half-stream's HTTP parser rejected the bytes as malformed; the
    /// connection entry is removed without emitting a message.
    Malformed(HttpParseError),
}

/// Returns true if `(a - b) mod 2^32`, interpreted as signed, is negative
/// — i.e. `a` is "before" `b` in modular sequence-number space.
fn seq_lt(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

/// Maintains reassembly state for every half-stream observed on one
/// capture source (one `Reassembler` per thread; see the pipeline
/// module's concurrency design).
#[derive(Default)]
pub struct Reassembler {
    connections: HashMap<ConnectionKey, ConnectionState>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one TCP segment's sequence number, FIN flag, and payload for
    /// the given half-stream key.
    ///
    /// Admission: a key absent from the table is admitted only when
    /// `payload` looks like the start of an HTTP/1.x message; otherwise
    /// the segment is dropped silently and no state is allocated.
    ///
    /// Drain policy (resolves the spec's sequencing open question): the
    /// drain loop advances `next_seq` by the length of the *buffered*
    /// segment it just fed, not the incoming segment that triggered the
    /// drain.
    pub fn on_segment(
        &mut self,
        key: ConnectionKey,
        seq: u32,
        fin: bool,
        payload: &[u8],
    ) -> SegmentOutcome {
        if !self.connections.contains_key(&key) {
            if !looks_like_http_start(payload) {
                return SegmentOutcome::Ignored;
            }
            self.connections.insert(
                key,
                ConnectionState {
                    next_seq: seq.wrapping_add(payload.len() as u32),
                    ooo_buffer: BinaryHeap::new(),
                    parser: HttpParser::new(),
                },
            );
            return self.feed_and_finalize(key, payload, fin);
        }

        let next_seq = self.connections.get(&key).expect("checked above").next_seq;

        if seq == next_seq {
            if !payload.is_empty() {
                let state = self.connections.get_mut(&key).expect("checked above");
                state.next_seq = state.next_seq.wrapping_add(payload.len() as u32);
                if let Err(e) = state.parser.feed_data(payload) {
                    self.connections.remove(&key);
                    return SegmentOutcome::Malformed(e);
                }
            }
            if let Some(outcome) = self.drain(key) {
                return outcome;
            }
            self.finalize_if_needed(key, fin)
        } else if seq_lt(next_seq, seq) {
            let state = self.connections.get_mut(&key).expect("checked above");
            state.ooo_buffer.push(Reverse(BufferedSegment {
                seq,
                payload: payload.to_vec(),
            }));
            self.finalize_if_needed(key, fin)
        } else {
            // seq < next_seq: retransmission of already-delivered bytes.
            self.finalize_if_needed(key, fin)
        }
    }

    fn feed_and_finalize(
        &mut self,
        key: ConnectionKey,
        payload: &[u8],
        fin: bool,
    ) -> SegmentOutcome {
        let state = self.connections.get_mut(&key).expect("just inserted");
        if let Err(e) = state.parser.feed_data(payload) {
            self.connections.remove(&key);
            return SegmentOutcome::Malformed(e);
        }
        self.finalize_if_needed(key, fin)
    }

    /// Drain contiguous buffered segments into the parser. Returns
    /// `Some(Malformed(..))` if draining hit a parse error (the caller
    /// must not continue to `finalize_if_needed` in that case); `None`
    /// otherwise.
    fn drain(&mut self, key: ConnectionKey) -> Option<SegmentOutcome> {
        loop {
            let state = self.connections.get_mut(&key)?;
            let Some(Reverse(top)) = state.ooo_buffer.peek() else {
                return None;
            };
            let top_seq = top.seq;

            if seq_lt(top_seq, state.next_seq) {
                state.ooo_buffer.pop();
                continue;
            }
            if top_seq != state.next_seq {
                return None;
            }

            let Reverse(buffered) = state.ooo_buffer.pop().expect("just peeked");
            state.next_seq = state.next_seq.wrapping_add(buffered.payload.len() as u32);
            if let Err(e) = state.parser.feed_data(&buffered.payload) {
                self.connections.remove(&key);
                return Some(SegmentOutcome::Malformed(e));
            }
        }
    }

    fn finalize_if_needed(&mut self, key: ConnectionKey, fin: bool) -> SegmentOutcome {
        let Some(state) = self.connections.get(&key) else {
            // Connection was already torn down (e.g. by a malformed drain).
            return SegmentOutcome::Ignored;
        };

        if fin || state.parser.is_complete() {
            let state = self.connections.remove(&key).expect("checked above");
            SegmentOutcome::Completed(state.parser.into_message())
        } else {
            SegmentOutcome::Pending
        }
    }

    /// Number of half-streams currently tracked. Exposed for tests and
    /// for bounding memory diagnostics.
    pub fn active_connections(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ConnectionKey {
        ConnectionKey {
            src_ip: "10.0.0.1".parse().unwrap(),
            dst_ip: "10.0.0.2".parse().unwrap(),
            src_port: 12345,
            dst_port: 80,
        }
    }

    const S2: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nHELLO";

    #[test]
    fn s1_single_segment_request_completes() {
        let mut r = Reassembler::new();
        let payload = b"GET /index.html HTTP/1.1\r\nHost: a.example\r\nContent-Length: 0\r\n\r\n";
        let outcome = r.on_segment(key(), 1000, false, payload);
        match outcome {
            SegmentOutcome::Completed(msg) => {
                assert_eq!(msg.kind(), "GET");
                assert_eq!(msg.summary(), "HTTP Request");
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        assert_eq!(r.active_connections(), 0);
    }

    #[test]
    fn s3_out_of_order_arrival_reassembles_in_order() {
        // Admission only triggers on a segment that looks like an HTTP
        // start; the start-bearing chunk (seq=1000) must be the one that
        // establishes the connection. Once admitted, later chunks may
        // still arrive out of order and are buffered on the min-heap —
        // here the third chunk (seq=1040) arrives before the second
        // (seq=1020).
        let chunks = [&S2[0..20], &S2[20..40], &S2[40..]];
        let mut r = Reassembler::new();

        let first = r.on_segment(key(), 1000, false, chunks[0]);
        assert_eq!(first, SegmentOutcome::Pending);

        let buffered = r.on_segment(key(), 1040, false, chunks[2]);
        assert_eq!(buffered, SegmentOutcome::Pending);

        let drained = r.on_segment(key(), 1020, false, chunks[1]);
        match drained {
            SegmentOutcome::Completed(msg) => {
                assert_eq!(msg.body, b"HELLO");
            }
            other => panic!("expected Completed after draining buffered segment, got {other:?}"),
        }
    }

    #[test]
    fn s4_retransmission_is_idempotent() {
        let mut r = Reassembler::new();
        let first = r.on_segment(key(), 1000, false, S2);
        assert!(matches!(first, SegmentOutcome::Completed(_)));

        // Same 4-tuple, same bytes again: since the connection was torn
        // down on completion, this is treated as a fresh admission.
        let second = r.on_segment(key(), 1000, false, S2);
        assert!(matches!(second, SegmentOutcome::Completed(_)));
    }

    #[test]
    fn retransmission_within_live_connection_is_discarded() {
        let mut r = Reassembler::new();
        let req = b"GET / HTTP/1.1\r\nContent-Length: 5\r\n\r\n";
        let pending = r.on_segment(key(), 1000, false, req);
        assert_eq!(pending, SegmentOutcome::Pending);

        // Retransmit the same initial segment: seq < next_seq, discarded.
        let retransmit = r.on_segment(key(), 1000, false, req);
        assert_eq!(retransmit, SegmentOutcome::Pending);
        assert_eq!(r.active_connections(), 1);
    }

    #[test]
    fn s5_non_http_payload_is_dropped_without_state() {
        let mut r = Reassembler::new();
        let random = [0xde, 0xad, 0xbe, 0xef];
        let outcome = r.on_segment(key(), 1, false, &random);
        assert_eq!(outcome, SegmentOutcome::Ignored);
        assert_eq!(r.active_connections(), 0);
    }

    #[test]
    fn s6_fin_with_empty_payload_and_no_content_length_finalizes() {
        let mut r = Reassembler::new();
        let payload = b"HTTP/1.1 200 OK\r\n\r\n";
        let outcome = r.on_segment(key(), 1, true, payload);
        assert!(matches!(outcome, SegmentOutcome::Completed(_)));
    }

    #[test]
    fn fin_with_nonempty_payload_delivers_then_finalizes() {
        let mut r = Reassembler::new();
        let start = r.on_segment(key(), 1000, false, b"GET / HTTP/1.1\r\n");
        assert_eq!(start, SegmentOutcome::Pending);

        let outcome = r.on_segment(key(), 1000 + 16, true, b"Host: x\r\n\r\n");
        assert!(matches!(outcome, SegmentOutcome::Completed(_)));
    }

    #[test]
    fn zero_length_payload_on_existing_connection_advances_nothing() {
        let mut r = Reassembler::new();
        let start = r.on_segment(key(), 1000, false, b"GET / HTTP/1.1\r\n");
        assert_eq!(start, SegmentOutcome::Pending);

        let outcome = r.on_segment(key(), 1000 + 16, false, b"");
        assert_eq!(outcome, SegmentOutcome::Pending);
        assert_eq!(r.active_connections(), 1);
    }

    #[test]
    fn malformed_header_tears_down_connection_without_emitting() {
        let mut r = Reassembler::new();
        let outcome = r.on_segment(key(), 1000, false, b"GET / HTTP/1.1\r\nBadHeader\r\n\r\n");
        assert!(matches!(outcome, SegmentOutcome::Malformed(_)));
        assert_eq!(r.active_connections(), 0);
    }

    #[test]
    fn reordering_invariance_any_permutation_yields_same_message() {
        // Admission requires the start-bearing segment (seq=2000) to be
        // the first one seen for this key; once admitted, the remaining
        // two chunks may arrive in either order via the out-of-order
        // heap and must still yield a byte-identical message.
        let start = &S2[0..15];
        let tail_chunks = [(2015u32, &S2[15..30]), (2030u32, &S2[30..])];

        let orderings: [[usize; 2]; 2] = [[0, 1], [1, 0]];

        let mut results = Vec::new();
        for ordering in orderings {
            let mut r = Reassembler::new();
            r.on_segment(key(), 2000, false, start);
            let mut last = SegmentOutcome::Ignored;
            for &i in &ordering {
                let (seq, payload) = tail_chunks[i];
                last = r.on_segment(key(), seq, false, payload);
            }
            match last {
                SegmentOutcome::Completed(msg) => results.push(msg),
                other => panic!("expected Completed for ordering {ordering:?}, got {other:?}"),
            }
        }

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], results[1]);
        assert_eq!(results[0].body, b"HELLO");
    }
}
