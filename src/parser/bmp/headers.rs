use crate::models::*;
use crate::parser::bmp::error::ParserBmpError;
use crate::parser::ReadUtils;
use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::net::IpAddr;

/// Only BMP version 3 (RFC 7854) frames are accepted.
pub const BMP_VERSION: u8 = 3;

/// Size of the fixed common header: version + length + type.
pub const BMP_COMMON_HEADER_LEN: usize = 6;

/// BMP message type.
///
/// ```text
///    o  Message Type (1 byte): This identifies the type of the BMP
///       message.
///
///       *  Type = 0: Route Monitoring
///       *  Type = 1: Statistics Report
///       *  Type = 2: Peer Down Notification
///       *  Type = 3: Peer Up Notification
///       *  Type = 4: Initiation Message
///       *  Type = 5: Termination Message
/// ```
#[derive(Debug, TryFromPrimitive, IntoPrimitive, PartialEq, Eq, Hash, Copy, Clone)]
#[repr(u8)]
pub enum BmpMsgType {
    RouteMonitoring = 0,
    StatisticsReport = 1,
    PeerDownNotification = 2,
    PeerUpNotification = 3,
    InitiationMessage = 4,
    TerminationMessage = 5,
}

impl BmpMsgType {
    /// Types below 4 carry a per-peer header between the common header and
    /// the message body.
    pub const fn has_per_peer_header(&self) -> bool {
        (*self as u8) < 4
    }
}

/// BMP Common Header
///
/// ```text
///       0                   1                   2                   3
///       0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///      +-+-+-+-+-+-+-+-+
///      |    Version    |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                        Message Length                         |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |   Msg. Type   |
///      +---------------+
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BmpCommonHeader {
    pub version: u8,
    pub msg_len: u32,
    pub msg_type: BmpMsgType,
}

pub fn parse_bmp_common_header(data: &mut &[u8]) -> Result<BmpCommonHeader, ParserBmpError> {
    let version = data.read_u8()?;
    if version != BMP_VERSION {
        return Err(ParserBmpError::UnsupportedBmpVersion(version));
    }

    let msg_len = data.read_u32()?;
    if (msg_len as usize) < BMP_COMMON_HEADER_LEN {
        return Err(ParserBmpError::CorruptedBmpMessage);
    }

    let msg_type = BmpMsgType::try_from(data.read_u8()?)?;
    Ok(BmpCommonHeader {
        version,
        msg_len,
        msg_type,
    })
}

/// BMP peer type (RFC 7854 Section 10.2, RFC 9069).
#[derive(Debug, TryFromPrimitive, IntoPrimitive, PartialEq, Eq, Hash, Copy, Clone)]
#[repr(u8)]
pub enum BmpPeerType {
    Global = 0,
    Rd = 1,
    Local = 2,
    LocalRib = 3,
}

bitflags! {
    /// Per-peer header flags (RFC 7854 Section 4.2, RFC 8671).
    ///
    /// V: peer address is IPv6. L: post-policy Adj-RIB-In. A: the embedded
    /// BGP messages use the legacy 2-byte AS_PATH format. O: Adj-RIB-Out.
    /// For a Local-RIB peer the top bit is F (filtered) instead.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct PeerFlags: u8 {
        const V = 0b1000_0000;
        const L = 0b0100_0000;
        const A = 0b0010_0000;
        const O = 0b0001_0000;
    }
}

/// BMP Per-peer Header
///
/// ```text
///       0                   1                   2                   3
///       0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |   Peer Type   |  Peer Flags   |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |         Peer Distinguisher (present based on peer type)       |
///      |                                                               |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                 Peer Address (16 bytes)                       |
///      ~                                                               ~
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                           Peer AS                             |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                         Peer BGP ID                           |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                    Timestamp (seconds)                        |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                  Timestamp (microseconds)                     |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BmpPerPeerHeader {
    pub peer_type: BmpPeerType,
    pub peer_flags: PeerFlags,
    pub peer_distinguisher: RouteDistinguisher,
    pub peer_ip: IpAddr,
    pub peer_asn: u32,
    pub peer_bgp_id: std::net::Ipv4Addr,
    pub ts_secs: u32,
    pub ts_usecs: u32,
}

impl BmpPerPeerHeader {
    pub const fn afi(&self) -> Afi {
        if self.peer_flags.contains(PeerFlags::V) {
            Afi::Ipv6
        } else {
            Afi::Ipv4
        }
    }

    pub const fn asn_len(&self) -> AsnLength {
        if self.peer_flags.contains(PeerFlags::A) {
            AsnLength::Bits16
        } else {
            AsnLength::Bits32
        }
    }

    pub fn timestamp(&self) -> f64 {
        self.ts_secs as f64 + self.ts_usecs as f64 / 1_000_000.0
    }
}

pub fn parse_per_peer_header(data: &mut &[u8]) -> Result<BmpPerPeerHeader, ParserBmpError> {
    let peer_type = BmpPeerType::try_from(data.read_u8()?)?;

    let flag_bits = data.read_u8()?;
    let peer_flags = match peer_type {
        // the Local-RIB F bit occupies the same position as V
        BmpPeerType::LocalRib => PeerFlags::from_bits_retain(flag_bits & PeerFlags::V.bits()),
        _ => PeerFlags::from_bits(flag_bits).ok_or(ParserBmpError::CorruptedBmpMessage)?,
    };

    let mut rd = [0u8; 8];
    data.read_exact(&mut rd)?;
    let peer_distinguisher = RouteDistinguisher(rd);

    let peer_ip: IpAddr = if peer_flags.contains(PeerFlags::V) && peer_type != BmpPeerType::LocalRib
    {
        data.read_ipv6_address()?.into()
    } else {
        // IPv4 address zero-padded in the upper 12 bytes
        data.advance(12)?;
        data.read_ipv4_address()?.into()
    };

    let peer_asn: u32 = if peer_flags.contains(PeerFlags::A) {
        data.advance(2)?;
        data.read_u16()? as u32
    } else {
        data.read_u32()?
    };

    let peer_bgp_id = data.read_ipv4_address()?;
    let ts_secs = data.read_u32()?;
    let ts_usecs = data.read_u32()?;

    Ok(BmpPerPeerHeader {
        peer_type,
        peer_flags,
        peer_distinguisher,
        peer_ip,
        peer_asn,
        peer_bgp_id,
        ts_secs,
        ts_usecs,
    })
}
