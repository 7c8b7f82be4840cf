//! BMP message parsing.
//!
//! <https://datatracker.ietf.org/doc/html/rfc7854>
//!
//! The collector's dispatcher drives these decoders piecewise (header
//! first, then the per-type body) so that record emission can interleave
//! with parsing; [`parse_bmp_msg`] bundles the same pieces into one call
//! for consumers that hold a complete message.

pub mod error;
pub mod headers;
pub mod initiation;
pub mod peer_down;
pub mod peer_up;
pub mod stats_report;
pub mod termination;

pub use error::ParserBmpError;
pub use headers::*;
pub use initiation::*;
pub use peer_down::*;
pub use peer_up::*;
pub use stats_report::*;
pub use termination::*;

use crate::models::{AsnLength, BgpMessage, BgpUpdateMessage};
use crate::parser::bgp::messages::parse_bgp_message;

#[derive(Debug)]
pub struct BmpMessage {
    pub common_header: BmpCommonHeader,
    pub per_peer_header: Option<BmpPerPeerHeader>,
    pub message_body: MessageBody,
}

#[derive(Debug)]
pub enum MessageBody {
    RouteMonitoring(BgpUpdateMessage),
    StatsReport(StatsReport),
    PeerDownNotification(PeerDownNotification),
    PeerUpNotification(PeerUpNotification),
    InitiationMessage(InitiationMessage),
    TerminationMessage(TerminationMessage),
}

/// Parse one complete BMP message (common header included).
pub fn parse_bmp_msg(data: &mut &[u8]) -> Result<BmpMessage, ParserBmpError> {
    let common_header = parse_bmp_common_header(data)?;
    let body_len = (common_header.msg_len as usize)
        .checked_sub(BMP_COMMON_HEADER_LEN)
        .ok_or(ParserBmpError::CorruptedBmpMessage)?;
    let whole = *data;
    if whole.len() < body_len {
        return Err(ParserBmpError::TruncatedBmpMessage);
    }
    let (mut body, rest) = whole.split_at(body_len);
    *data = rest;

    let per_peer_header = match common_header.msg_type.has_per_peer_header() {
        true => Some(parse_per_peer_header(&mut body)?),
        false => None,
    };

    let message_body = match common_header.msg_type {
        BmpMsgType::RouteMonitoring => {
            let asn_len = per_peer_header
                .as_ref()
                .map(|h| h.asn_len())
                .unwrap_or(AsnLength::Bits32);
            match parse_bgp_message(&mut body, false, asn_len)? {
                BgpMessage::Update(update) => MessageBody::RouteMonitoring(update),
                other => {
                    log::warn!(
                        "route monitoring carried a non-UPDATE BGP message: {:?}",
                        other.msg_type()
                    );
                    return Err(ParserBmpError::CorruptedBmpMessage);
                }
            }
        }
        BmpMsgType::StatisticsReport => MessageBody::StatsReport(parse_stats_report(&mut body)?),
        BmpMsgType::PeerDownNotification => {
            MessageBody::PeerDownNotification(parse_peer_down_notification(&mut body)?)
        }
        BmpMsgType::PeerUpNotification => {
            let afi = per_peer_header
                .as_ref()
                .map(|h| h.afi())
                .unwrap_or(crate::models::Afi::Ipv4);
            MessageBody::PeerUpNotification(parse_peer_up_notification(&mut body, &afi)?)
        }
        BmpMsgType::InitiationMessage => {
            MessageBody::InitiationMessage(parse_initiation_message(&mut body)?)
        }
        BmpMsgType::TerminationMessage => {
            MessageBody::TerminationMessage(parse_termination_message(&mut body)?)
        }
    };

    Ok(BmpMessage {
        common_header,
        per_peer_header,
        message_body,
    })
}
