use crate::error::ParserError;
use crate::models::*;
use crate::parser::bgp::attributes::parse_attributes;
use crate::parser::{parse_nlri_list, ReadUtils};
use log::warn;

/// BGP message
///
/// Format:
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                                                               +
/// |                           Marker                              |
/// +                                                               +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          Length               |      Type     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
pub fn parse_bgp_message(
    data: &mut &[u8],
    add_path: bool,
    asn_len: AsnLength,
) -> Result<BgpMessage, ParserError> {
    data.require_n_remaining(19, "BGP message header")?;
    data.advance(16)?;
    /*
    The length field must always be at least 19 and no greater than 4096;
    "padding" of extra data after the message is not allowed.
    */
    let length = data.read_u16()?;
    if !(19..=4096).contains(&length) {
        return Err(ParserError::InvalidBgpMessageLength(length));
    }
    let body_length = length as usize - 19;

    let msg_type = BgpMessageType::try_from(data.read_u8()?)
        .map_err(|e| ParserError::ParseError(format!("unknown BGP message type: {}", e.number)))?;

    if data.remaining() < body_length {
        return Err(ParserError::IoNotEnoughBytes {
            name: "BGP message body",
            expected: body_length,
            found: data.remaining(),
        });
    }
    let mut msg_data = data.split_to(body_length)?;

    Ok(match msg_type {
        BgpMessageType::OPEN => BgpMessage::Open(parse_bgp_open_message(&mut msg_data)?),
        BgpMessageType::UPDATE => {
            BgpMessage::Update(parse_bgp_update_message(msg_data, add_path, asn_len)?)
        }
        BgpMessageType::NOTIFICATION => {
            BgpMessage::Notification(parse_bgp_notification_message(msg_data)?)
        }
        BgpMessageType::KEEPALIVE => BgpMessage::KeepAlive,
    })
}

/// Parse a BGP NOTIFICATION message.
///
/// The error code/subcode pair is carried through verbatim; unknown codes
/// render as such downstream but never fail the parse.
pub fn parse_bgp_notification_message(
    mut input: &[u8],
) -> Result<BgpNotificationMessage, ParserError> {
    let error_code = input.read_u8()?;
    let error_subcode = input.read_u8()?;
    let data = input.read_n_bytes(input.remaining())?;

    Ok(BgpNotificationMessage {
        error: BgpError::new(error_code, error_subcode),
        data,
    })
}

/// Parse a BGP OPEN message, including the capability options.
pub fn parse_bgp_open_message(input: &mut &[u8]) -> Result<BgpOpenMessage, ParserError> {
    input.require_n_remaining(10, "BGP open message header")?;
    let version = input.read_u8()?;
    let asn = Asn::new_16bit(input.read_u16()?);
    let hold_time = input.read_u16()?;
    let sender_ip = input.read_ipv4_address()?;
    let opt_params_len = input.read_u8()?;

    if input.remaining() != opt_params_len as usize {
        warn!(
            "BGP open optional parameter length {} does not match the actual length {}",
            opt_params_len,
            input.remaining()
        );
    }

    let mut params: Vec<OptParam> = vec![];
    while input.remaining() >= 2 {
        let param_type = input.read_u8()?;
        let param_length = input.read_u8()?;

        // https://tools.ietf.org/html/rfc3392
        let param_value = match param_type {
            2 => {
                let code = input.read_u8()?;
                let len = input.read_u8()?;
                ParamValue::Capability(Capability {
                    ty: BgpCapabilityType::from(code),
                    value: input.read_n_bytes(len as usize)?,
                })
            }
            _ => {
                // unsupported param, read as raw bytes
                ParamValue::Raw(input.read_n_bytes(param_length as usize)?)
            }
        };
        params.push(OptParam {
            param_type,
            param_len: param_length as u16,
            param_value,
        });
    }

    Ok(BgpOpenMessage {
        version,
        asn,
        hold_time,
        sender_ip,
        opt_params: params,
    })
}

/// read nlri portion of a bgp update message.
fn read_nlri(mut input: &[u8], afi: &Afi, add_path: bool) -> Result<Vec<NetworkPrefix>, ParserError> {
    if input.is_empty() {
        return Ok(vec![]);
    }
    if input.len() == 1 {
        // 1 byte does not make sense
        warn!("seeing strange one-byte NLRI field");
        input.advance(1)?;
        return Ok(vec![]);
    }
    parse_nlri_list(input, add_path, afi)
}

/// read bgp update message.
///
/// RFC: <https://tools.ietf.org/html/rfc4271#section-4.3>
pub fn parse_bgp_update_message(
    mut input: &[u8],
    add_path: bool,
    asn_len: AsnLength,
) -> Result<BgpUpdateMessage, ParserError> {
    // AFI for routes outside the attributes is IPv4 only.
    let afi = Afi::Ipv4;

    let withdrawn_bytes_length = input.read_u16()? as usize;
    let withdrawn_bytes = input.split_to(withdrawn_bytes_length)?;
    let withdrawn_prefixes = read_nlri(withdrawn_bytes, &afi, add_path)?;

    let attribute_length = input.read_u16()? as usize;
    let attr_data_slice = input.split_to(attribute_length)?;
    let attributes = parse_attributes(attr_data_slice, asn_len, add_path)?;

    // the remaining bytes are announced prefixes.
    let announced_prefixes = read_nlri(input, &afi, add_path)?;

    Ok(BgpUpdateMessage {
        withdrawn_prefixes,
        attributes,
        announced_prefixes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_bgp(msg_type: u8, body: &[u8]) -> Vec<u8> {
        let mut data = vec![0xffu8; 16];
        data.extend_from_slice(&((19 + body.len()) as u16).to_be_bytes());
        data.push(msg_type);
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_parse_open() {
        let mut body = vec![
            4, // version
            0xfd, 0xe8, // asn 65000
            0x00, 0xb4, // hold time 180
            10, 0, 0, 1, // bgp id
        ];
        // one capability option: 4-octet ASN (65), length 4
        let caps = [2u8, 6, 65, 4, 0, 3, 13, 5];
        body.push(caps.len() as u8);
        body.extend_from_slice(&caps);

        let data = wrap_bgp(1, &body);
        let msg = parse_bgp_message(&mut data.as_slice(), false, AsnLength::Bits32).unwrap();
        let open = match msg {
            BgpMessage::Open(open) => open,
            _ => panic!("expected OPEN"),
        };
        assert_eq!(open.version, 4);
        assert_eq!(open.asn, 65000u32);
        assert_eq!(open.hold_time, 180);
        assert_eq!(open.sender_ip.to_string(), "10.0.0.1");
        let caps: Vec<_> = open.capabilities().collect();
        assert_eq!(caps.len(), 1);
        assert_eq!(
            caps[0].ty,
            BgpCapabilityType::SUPPORT_FOR_4_OCTET_AS_NUMBER_CAPABILITY
        );
    }

    #[test]
    fn test_parse_notification() {
        let data = wrap_bgp(3, &[6, 2]);
        let msg = parse_bgp_message(&mut data.as_slice(), false, AsnLength::Bits32).unwrap();
        match msg {
            BgpMessage::Notification(n) => {
                assert_eq!(n.error, BgpError::new(6, 2));
                assert!(n.data.is_empty());
            }
            _ => panic!("expected NOTIFICATION"),
        }
    }

    #[test]
    fn test_parse_keepalive() {
        let data = wrap_bgp(4, &[]);
        let msg = parse_bgp_message(&mut data.as_slice(), false, AsnLength::Bits32).unwrap();
        assert_eq!(msg, BgpMessage::KeepAlive);
    }

    #[test]
    fn test_parse_update_with_announcement() {
        let mut body = vec![0u8, 0]; // no withdrawals
        let attrs = {
            let mut a = vec![];
            // ORIGIN = IGP
            a.extend_from_slice(&[0b0100_0000, 1, 1, 0]);
            // AS_PATH: one sequence of [65000, 65001]
            a.extend_from_slice(&[0b0100_0000, 2, 10, 2, 2, 0, 0, 0xfd, 0xe8, 0, 0, 0xfd, 0xe9]);
            // NEXT_HOP
            a.extend_from_slice(&[0b0100_0000, 3, 4, 10, 0, 0, 9]);
            a
        };
        body.extend_from_slice(&(attrs.len() as u16).to_be_bytes());
        body.extend_from_slice(&attrs);
        // announced: 192.0.2.0/24
        body.extend_from_slice(&[24, 192, 0, 2]);

        let data = wrap_bgp(2, &body);
        let msg = parse_bgp_message(&mut data.as_slice(), false, AsnLength::Bits32).unwrap();
        let update = match msg {
            BgpMessage::Update(update) => update,
            _ => panic!("expected UPDATE"),
        };
        assert!(update.withdrawn_prefixes.is_empty());
        assert_eq!(update.announced_prefixes.len(), 1);
        assert_eq!(update.announced_prefixes[0].to_string(), "192.0.2.0/24");
        assert_eq!(update.attributes.origin(), Origin::IGP);
        assert_eq!(update.attributes.as_path().unwrap().to_string(), "65000 65001");
        assert_eq!(
            update.attributes.next_hop(),
            Some("10.0.0.9".parse().unwrap())
        );
    }

    #[test]
    fn test_parse_update_end_of_rib() {
        let data = wrap_bgp(2, &[0, 0, 0, 0]);
        let msg = parse_bgp_message(&mut data.as_slice(), false, AsnLength::Bits32).unwrap();
        match msg {
            BgpMessage::Update(update) => assert!(update.is_end_of_rib()),
            _ => panic!("expected UPDATE"),
        }
    }

    #[test]
    fn test_invalid_length_rejected() {
        let mut data = vec![0xffu8; 16];
        data.extend_from_slice(&18u16.to_be_bytes());
        data.push(4);
        assert!(parse_bgp_message(&mut data.as_slice(), false, AsnLength::Bits32).is_err());
    }
}
