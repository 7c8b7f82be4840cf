use crate::error::ParserError;
use crate::models::*;
use crate::parser::bgp::messages::parse_bgp_message;
use crate::parser::bmp::error::ParserBmpError;
use crate::parser::ReadUtils;
use std::net::IpAddr;

/// The fixed leading part of a PEER_UP body: local address and ports.
///
/// ```text
///       0                   1                   2                   3
///       0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |                 Local Address (16 bytes)                      |
///      ~                                                               ~
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///      |         Local Port            |        Remote Port            |
///      +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PeerUpEventHeader {
    pub local_addr: IpAddr,
    pub local_port: u16,
    pub remote_port: u16,
}

pub fn parse_peer_up_header(
    data: &mut &[u8],
    afi: &Afi,
) -> Result<PeerUpEventHeader, ParserError> {
    let local_addr: IpAddr = match afi {
        Afi::Ipv4 => {
            data.advance(12)?;
            data.read_ipv4_address()?.into()
        }
        Afi::Ipv6 => data.read_ipv6_address()?.into(),
    };
    let local_port = data.read_u16()?;
    let remote_port = data.read_u16()?;

    Ok(PeerUpEventHeader {
        local_addr,
        local_port,
        remote_port,
    })
}

#[derive(Debug)]
pub struct PeerUpNotification {
    pub header: PeerUpEventHeader,
    pub sent_open: Option<BgpOpenMessage>,
    pub received_open: Option<BgpOpenMessage>,
    pub tlvs: Vec<PeerUpTlv>,
}

#[derive(Debug)]
pub struct PeerUpTlv {
    pub info_type: u16,
    pub info_len: u16,
    pub info_value: String,
}

/// Parse a full PEER_UP body: event header, the two OPEN PDUs the router
/// exchanged with its peer, and any trailing information TLVs.
///
/// Some routers omit the OPEN messages entirely; that parses to `None`.
pub fn parse_peer_up_notification(
    data: &mut &[u8],
    afi: &Afi,
) -> Result<PeerUpNotification, ParserBmpError> {
    let header = parse_peer_up_header(data, afi)?;

    let (sent_open, received_open) = match data.remaining() {
        0 => (None, None),
        _ => {
            let sent = expect_open(parse_bgp_message(data, false, AsnLength::Bits32)?)?;
            let received = expect_open(parse_bgp_message(data, false, AsnLength::Bits32)?)?;
            (Some(sent), Some(received))
        }
    };

    let mut tlvs = vec![];
    while data.remaining() >= 4 {
        let info_type = data.read_u16()?;
        let info_len = data.read_u16()?;
        let info_value = data.read_n_bytes_to_string(info_len as usize)?;
        tlvs.push(PeerUpTlv {
            info_type,
            info_len,
            info_value,
        });
    }

    Ok(PeerUpNotification {
        header,
        sent_open,
        received_open,
        tlvs,
    })
}

fn expect_open(msg: BgpMessage) -> Result<BgpOpenMessage, ParserBmpError> {
    match msg {
        BgpMessage::Open(open) => Ok(open),
        _ => Err(ParserBmpError::CorruptedBmpMessage),
    }
}
