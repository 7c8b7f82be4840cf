use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;
use std::net::IpAddr;

pub fn parse_next_hop(mut input: &[u8]) -> Result<AttributeValue, ParserError> {
    let addr = match input.remaining() {
        4 => IpAddr::V4(input.read_ipv4_address()?),
        16 => IpAddr::V6(input.read_ipv6_address()?),
        n => {
            return Err(ParserError::ParseError(format!(
                "invalid next hop length: {n}"
            )))
        }
    };
    Ok(AttributeValue::NextHop(addr))
}

/// Next hop field of an MP_REACH_NLRI attribute. IPv6 next hops may carry a
/// second, link-local address (RFC 2545, Section 3).
pub fn parse_mp_next_hop(mut input: &[u8]) -> Result<Option<NextHopAddress>, ParserError> {
    let output = match input.remaining() {
        0 => None,
        4 => Some(NextHopAddress::Ipv4(input.read_ipv4_address()?)),
        16 => Some(NextHopAddress::Ipv6(input.read_ipv6_address()?)),
        32 => Some(NextHopAddress::Ipv6LinkLocal(
            input.read_ipv6_address()?,
            input.read_ipv6_address()?,
        )),
        n => {
            return Err(ParserError::ParseError(format!(
                "invalid MP next hop length: {n}"
            )))
        }
    };
    Ok(output)
}
