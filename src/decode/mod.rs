//! Pure binary decoders for the Ethernet/IPv4/IPv6/TCP layers.
//!
//! Every decoder in this module takes a borrowed byte slice and returns a
//! view into it — none of them mutate shared state or allocate beyond the
//! small fixed-size fields they copy out (MAC bytes, IP addresses).

pub mod ethernet;
pub mod ipv4;
pub mod ipv6;
pub mod tcp;

use std::net::IpAddr;

use crate::error::DecodeError;

/// TCP protocol number (IANA).
pub const PROTO_TCP: u8 = 6;

/// A uniform view over a decoded IPv4 or IPv6 header, used by the
/// dispatcher so it does not need to match on the network-layer variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetHeader<'a> {
    V4(ipv4::Ipv4Header<'a>),
    V6(ipv6::Ipv6Header<'a>),
}

impl<'a> NetHeader<'a> {
    pub fn src_ip(&self) -> IpAddr {
        match self {
            NetHeader::V4(h) => IpAddr::V4(h.src),
            NetHeader::V6(h) => IpAddr::V6(h.src),
        }
    }

    pub fn dst_ip(&self) -> IpAddr {
        match self {
            NetHeader::V4(h) => IpAddr::V4(h.dst),
            NetHeader::V6(h) => IpAddr::V6(h.dst),
        }
    }

    pub fn protocol(&self) -> u8 {
        match self {
            NetHeader::V4(h) => h.protocol,
            NetHeader::V6(h) => h.protocol(),
        }
    }

    pub fn payload(&self) -> &'a [u8] {
        match self {
            NetHeader::V4(h) => h.payload,
            NetHeader::V6(h) => h.payload,
        }
    }
}

/// Decode the network layer given an Ethernet frame's ethertype and payload.
///
/// Dispatches on `ethertype`: IPv4 (0x0800) or IPv6 (0x86DD). Any other
/// ethertype fails with [`DecodeError::UnsupportedEthertype`].
pub fn decode_network(ethertype: u16, payload: &[u8]) -> Result<NetHeader<'_>, DecodeError> {
    match ethertype {
        ethernet::ETHERTYPE_IPV4 => ipv4::decode(payload).map(NetHeader::V4),
        ethernet::ETHERTYPE_IPV6 => ipv6::decode(payload).map(NetHeader::V6),
        _ => Err(DecodeError::UnsupportedEthertype),
    }
}
