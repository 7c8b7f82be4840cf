use crate::parser::bmp::error::ParserBmpError;
use crate::parser::ReadUtils;

/// PEER_DOWN reason codes (RFC 7854 Section 4.9).
pub const PEER_DOWN_LOCAL_NOTIFY: u8 = 1;
pub const PEER_DOWN_LOCAL_NO_NOTIFY: u8 = 2;
pub const PEER_DOWN_REMOTE_NOTIFY: u8 = 3;
pub const PEER_DOWN_REMOTE_NO_NOTIFY: u8 = 4;
pub const PEER_DOWN_INFO_CEASED: u8 = 5;

#[derive(Debug, PartialEq, Clone)]
pub struct PeerDownNotification {
    pub reason: u8,
    /// Reason-dependent payload: a BGP NOTIFICATION PDU for reasons 1 and
    /// 3, a 2-byte FSM event code for reason 2, nothing otherwise. Reason
    /// codes outside the assigned range are passed through with no payload
    /// so the caller can still report the peer as down.
    pub data: Option<Vec<u8>>,
}

pub fn parse_peer_down_notification(
    data: &mut &[u8],
) -> Result<PeerDownNotification, ParserBmpError> {
    let reason = data.read_u8()?;
    let bytes_left = data.remaining();
    let data = match reason {
        PEER_DOWN_LOCAL_NOTIFY | PEER_DOWN_LOCAL_NO_NOTIFY | PEER_DOWN_REMOTE_NOTIFY => {
            Some(data.read_n_bytes(bytes_left)?)
        }
        _ => None,
    };
    Ok(PeerDownNotification { reason, data })
}
