//! IPv4 header decoding (RFC 791).

use std::net::Ipv4Addr;

use crate::config::{IPV4_MAX_HEADER_LEN, IPV4_MIN_HEADER_LEN};
use crate::error::DecodeError;

/// A decoded IPv4 header, borrowing its payload from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header<'a> {
    pub ttl: u8,
    pub protocol: u8,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub ihl_bytes: usize,
    pub payload: &'a [u8],
}

/// Decode an IPv4 header from `raw` (the Ethernet payload).
///
/// Fails with [`DecodeError::ShortHeader`] if `raw.len() < 20`, with
/// [`DecodeError::BadVersion`] if the version nibble isn't 4, and with
/// [`DecodeError::BadIhl`] if the IHL is outside `[20, raw.len()]`.
pub fn decode(raw: &[u8]) -> Result<Ipv4Header<'_>, DecodeError> {
    if raw.len() < IPV4_MIN_HEADER_LEN {
        return Err(DecodeError::ShortHeader);
    }

    let version = raw[0] >> 4;
    if version != 4 {
        return Err(DecodeError::BadVersion);
    }

    let ihl_bytes = ((raw[0] & 0x0f) as usize) * 4;
    if ihl_bytes < IPV4_MIN_HEADER_LEN || ihl_bytes > IPV4_MAX_HEADER_LEN || ihl_bytes > raw.len() {
        return Err(DecodeError::BadIhl);
    }

    let ttl = raw[8];
    let protocol = raw[9];
    let src = Ipv4Addr::new(raw[12], raw[13], raw[14], raw[15]);
    let dst = Ipv4Addr::new(raw[16], raw[17], raw[18], raw[19]);

    Ok(Ipv4Header {
        ttl,
        protocol,
        src,
        dst,
        ihl_bytes,
        payload: &raw[ihl_bytes..],
    })
}
