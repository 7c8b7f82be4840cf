//! The per-connection collector core: framing, identity, dispatch, and the
//! message-bus interface.

mod bgp;
mod bus;
mod framer;
mod reader;
mod records;
mod registry;
mod template;
mod update;

pub use bus::{BusError, LoggingBus, MessageBus, PeerAction, PrefixAction, RouterAction};
pub use framer::{BmpFrame, Framer};
pub use reader::BmpReader;
pub use records::{
    derive_peer_hash, hash_to_str, PeerDownEvent, PeerRecord, PeerUpEvent, RouterRecord,
};
pub use registry::{PeerInfo, PeerKey, PeerMap};
pub use template::{TemplateEntry, TemplateMap, TemplateTopic};
pub use update::{AttrField, DecodedUpdate, PeerField, PrefixEntry, RouterField};

use std::net::IpAddr;

/// Upper bound for a single BMP message body. Large enough for a maximum
/// size BGP message (4096 octets) plus BMP headers many times over; one
/// byte more than this is treated as malformed input.
pub const BMP_PACKET_BUF_SIZE: usize = 68 * 1024;

/// Router TERM reason: the collector hit a local error on this connection.
pub const TERM_REASON_OPENBMP_CONN_ERR: u16 = 65534;

/// Bound applied to router TERM reason text.
pub const TERM_REASON_TEXT_MAX: usize = 255;

/// Debug switches consumed by the reader. `debug_bmp` traces BMP dispatch,
/// `debug_bgp` traces embedded BGP payload decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectorConfig {
    pub debug_bmp: bool,
    pub debug_bgp: bool,
}

/// Connection descriptor handed over by the supervisor that accepted the
/// client: the router's stable content hash and its observed address. The
/// input source itself is passed separately to [`BmpReader::run`] so the
/// supervisor can route either the raw socket or an intermediary pipe.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub hash_id: [u8; 16],
    pub addr: IpAddr,
}

impl ClientInfo {
    pub fn new(hash_id: [u8; 16], addr: IpAddr) -> Self {
        ClientInfo { hash_id, addr }
    }
}

/// Content hash identifying a router across reconnects: the MD5 of its
/// printable address.
pub fn router_hash(addr: &IpAddr) -> [u8; 16] {
    let mut ctx = md5::Context::new();
    ctx.consume(addr.to_string().as_bytes());
    ctx.compute().0
}
