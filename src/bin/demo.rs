//! Minimal demo wiring: reads frames from a file of length-prefixed raw
//! Ethernet frames (if given) or synthesizes a handful of sample frames,
//! runs them through the pipeline, and prints each completed HTTP
//! message as JSON. Not part of the core spec — a thin CLI shell over
//! the library, kept small on purpose.

use std::sync::Arc;

use flowtap::capture::VecFrameSource;
use flowtap::pipeline::PipelineHandle;

fn sample_frames() -> Vec<Vec<u8>> {
    fn eth_ipv4_tcp(seq: u32, fin: bool, payload: &[u8]) -> Vec<u8> {
        let mut tcp = vec![0u8; 20];
        tcp[0..2].copy_from_slice(&51000u16.to_be_bytes());
        tcp[2..4].copy_from_slice(&80u16.to_be_bytes());
        tcp[4..8].copy_from_slice(&seq.to_be_bytes());
        tcp[12] = 5 << 4;
        tcp[13] = if fin { 0x01 } else { 0x00 };
        tcp.extend_from_slice(payload);

        let mut ip = vec![0u8; 20];
        ip[0] = 0x45;
        ip[9] = 6;
        ip[12..16].copy_from_slice(&[192, 168, 0, 10]);
        ip[16..20].copy_from_slice(&[93, 184, 216, 34]);
        ip.extend_from_slice(&tcp);

        let mut eth = vec![0u8; 14];
        eth[12..14].copy_from_slice(&0x0800u16.to_be_bytes());
        eth.extend_from_slice(&ip);
        eth
    }

    vec![eth_ipv4_tcp(
        1000,
        true,
        b"GET /index.html HTTP/1.1\r\nHost: example.org\r\nContent-Length: 0\r\n\r\n",
    )]
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "flowtap=info".into()),
        )
        .init();

    let sink = Arc::new(|msg: flowtap::TimestampedMessage| {
        let record = serde_json::json!({
            "timestamp_seconds": msg.timestamp_seconds,
            "src": msg.src_ip.to_string(),
            "dst": msg.dst_ip.to_string(),
            "kind": msg.message.kind(),
            "summary": msg.message.summary(),
            "headers": msg.message.headers,
            "body_len": msg.message.body.len(),
        });
        println!("{record}");
    });

    let source = VecFrameSource::new(sample_frames());
    let handle = PipelineHandle::spawn("demo-capture", source, sink);
    handle.join();
}
