use crate::error::ParserError;
use crate::models::*;
use crate::parser::bgp::attributes::parse_mp_next_hop;
use crate::parser::{parse_nlri_list, ReadUtils};
use log::warn;

/// MP_REACH_NLRI / MP_UNREACH_NLRI - RFC 4760, Section 3.
///
/// ```text
/// +---------------------------------------------------------+
/// | Address Family Identifier (2 octets)                    |
/// +---------------------------------------------------------+
/// | Subsequent Address Family Identifier (1 octet)          |
/// +---------------------------------------------------------+
/// | Length of Next Hop Network Address (1 octet)            |
/// +---------------------------------------------------------+
/// | Network Address of Next Hop (variable)                  |
/// +---------------------------------------------------------+
/// | Reserved (1 octet)                                      |
/// +---------------------------------------------------------+
/// | Network Layer Reachability Information (variable)       |
/// +---------------------------------------------------------+
/// ```
///
/// The next-hop and reserved fields are only present in the reachable form.
pub fn parse_nlri(
    mut input: &[u8],
    reachable: bool,
    add_path: bool,
) -> Result<AttributeValue, ParserError> {
    let afi = input.read_afi()?;
    let safi = input.read_safi()?;

    let mut next_hop = None;
    if reachable {
        let next_hop_length = input.read_u8()? as usize;
        let next_hop_bytes = input.split_to(next_hop_length)?;
        next_hop = parse_mp_next_hop(next_hop_bytes)?;

        if input.read_u8()? != 0 {
            warn!("NLRI reserved byte not 0");
        }
    }

    let prefixes = parse_nlri_list(input, add_path, &afi)?;

    let nlri = Nlri {
        afi,
        safi,
        next_hop,
        prefixes,
    };
    match reachable {
        true => Ok(AttributeValue::MpReachNlri(nlri)),
        false => Ok(AttributeValue::MpUnreachNlri(nlri)),
    }
}
