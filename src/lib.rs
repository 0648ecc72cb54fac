//! A passive link-layer sniffer: Ethernet/IPv4/IPv6/TCP decoding, TCP
//! stream reassembly, and HTTP/1.x message extraction.
//!
//! The core pipeline is [`dispatch::Dispatcher`], which threads one raw
//! Ethernet frame at a time through [`decode`], into [`reassembly`], and
//! out as a completed [`http::HttpMessage`]. [`pipeline`] wires one or
//! more [`capture::FrameSource`]s to a [`pipeline::MessageSink`] on
//! dedicated OS threads. Raw socket acquisition, the operator-facing
//! table/filter UI, and process lifecycle/CLI plumbing are explicitly
//! out of scope — see `SPEC_FULL.md`.

pub mod capture;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod reassembly;

pub use dispatch::{Dispatcher, TimestampedMessage};
pub use http::HttpMessage;
pub use pipeline::{MessageSink, PipelineHandle};
pub use reassembly::{ConnectionKey, Reassembler};
