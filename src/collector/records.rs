//! Typed records emitted on the message bus, and the content-hash
//! derivations that identify them.

use crate::collector::TERM_REASON_TEXT_MAX;
use crate::models::{BgpNotificationMessage, BgpOpenMessage};
use crate::parser::bmp::{BmpPerPeerHeader, PeerFlags, PeerUpEventHeader};
use std::fmt::Write;
use std::net::Ipv4Addr;

/// Render a 16-byte hash as its printable lowercase hex form.
pub fn hash_to_str(hash: &[u8; 16]) -> String {
    let mut out = String::with_capacity(32);
    for byte in hash {
        // write! to a String cannot fail
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Derive the stable peer identity hash.
///
/// The digest input is, in fixed order: the printable peer address, the
/// canonical peer RD string, and the 16 raw router hash bytes. Downstream
/// consumers index on this value, so the derivation is a wire contract.
///
/// The peer BGP id is deliberately not hashed: some routers send 0.0.0.0
/// for it on subsequent PEER_UPs, which would fork the identity.
pub fn derive_peer_hash(peer_addr: &str, peer_rd: &str, router_hash: &[u8; 16]) -> [u8; 16] {
    let mut ctx = md5::Context::new();
    ctx.consume(peer_addr.as_bytes());
    ctx.consume(peer_rd.as_bytes());
    ctx.consume(router_hash);
    ctx.compute().0
}

/// One router as seen on one connection.
#[derive(Debug, Clone, Default)]
pub struct RouterRecord {
    pub hash_id: [u8; 16],
    pub ip_addr: String,
    /// Free-form name from the Initiation sysName TLV.
    pub name: Option<String>,
    /// Initiation sysDescr TLV.
    pub descr: Option<String>,
    /// Initiation free-form string TLVs.
    pub init_data: Vec<String>,
    pub term_reason_code: u16,
    pub term_reason_text: String,
}

impl RouterRecord {
    pub fn new(hash_id: [u8; 16], ip_addr: String) -> Self {
        RouterRecord {
            hash_id,
            ip_addr,
            ..Default::default()
        }
    }

    /// Record a termination reason, bounding the text.
    pub fn set_term_reason(&mut self, code: u16, text: &str) {
        self.term_reason_code = code;
        self.term_reason_text = match text.char_indices().nth(TERM_REASON_TEXT_MAX) {
            Some((idx, _)) => text[..idx].to_string(),
            None => text.to_string(),
        };
    }
}

/// One BGP peer of the monitored router. Carries its own copy of the
/// router hash so the record stays valid independent of the connection.
#[derive(Debug, Clone)]
pub struct PeerRecord {
    pub hash_id: [u8; 16],
    pub router_hash_id: [u8; 16],
    pub peer_addr: String,
    pub peer_rd: String,
    pub peer_bgp_id: Ipv4Addr,
    pub peer_as: u32,
    pub peer_type: u8,
    pub is_ipv6: bool,
    pub is_pre_policy: bool,
    pub is_two_octet_asn: bool,
    pub ts_secs: u32,
    pub ts_usecs: u32,
}

impl PeerRecord {
    /// Build the record for a per-peer header, deriving the peer hash.
    pub fn from_header(header: &BmpPerPeerHeader, router_hash_id: [u8; 16]) -> Self {
        let peer_addr = header.peer_ip.to_string();
        let peer_rd = header.peer_distinguisher.to_string();
        let hash_id = derive_peer_hash(&peer_addr, &peer_rd, &router_hash_id);
        PeerRecord {
            hash_id,
            router_hash_id,
            peer_addr,
            peer_rd,
            peer_bgp_id: header.peer_bgp_id,
            peer_as: header.peer_asn,
            peer_type: header.peer_type.into(),
            is_ipv6: header.peer_flags.contains(PeerFlags::V),
            is_pre_policy: !header.peer_flags.contains(PeerFlags::L),
            is_two_octet_asn: header.peer_flags.contains(PeerFlags::A),
            ts_secs: header.ts_secs,
            ts_usecs: header.ts_usecs,
        }
    }
}

/// PEER_UP payload forwarded with the `Up` action.
#[derive(Debug, Clone, Default)]
pub struct PeerUpEvent {
    pub local_ip: String,
    pub local_port: u16,
    pub remote_port: u16,
    pub sent_open: Option<BgpOpenMessage>,
    pub received_open: Option<BgpOpenMessage>,
    pub info_data: Vec<String>,
}

impl From<PeerUpEventHeader> for PeerUpEvent {
    fn from(header: PeerUpEventHeader) -> Self {
        PeerUpEvent {
            local_ip: header.local_addr.to_string(),
            local_port: header.local_port,
            remote_port: header.remote_port,
            ..Default::default()
        }
    }
}

/// PEER_DOWN payload forwarded with the `Down` action.
#[derive(Debug, Clone, Default)]
pub struct PeerDownEvent {
    pub reason: u8,
    /// FSM event code from a reason-2 body.
    pub fsm_event: Option<u16>,
    pub notification: Option<BgpNotificationMessage>,
    pub error_text: String,
}
