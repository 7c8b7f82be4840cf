use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;

const COMMUNITY_NO_EXPORT: u32 = 0xffff_ff01;
const COMMUNITY_NO_ADVERTISE: u32 = 0xffff_ff02;
const COMMUNITY_NO_EXPORT_SUB_CONFED: u32 = 0xffff_ff03;

pub fn parse_regular_communities(mut input: &[u8]) -> Result<AttributeValue, ParserError> {
    let mut communities = Vec::with_capacity(input.remaining() / 4);

    while input.remaining() > 0 {
        let community_val = input.read_u32()?;
        communities.push(match community_val {
            COMMUNITY_NO_EXPORT => Community::NoExport,
            COMMUNITY_NO_ADVERTISE => Community::NoAdvertise,
            COMMUNITY_NO_EXPORT_SUB_CONFED => Community::NoExportSubConfed,
            value => {
                let asn = Asn::new_16bit((value >> 16) as u16);
                let data = (value & 0xffff) as u16;
                Community::Custom(asn, data)
            }
        });
    }

    Ok(AttributeValue::Communities(communities))
}
