use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;

pub fn parse_aggregator(
    mut input: &[u8],
    asn_len: AsnLength,
) -> Result<(Asn, BgpIdentifier), ParserError> {
    // AS4_AGGREGATOR always carries a 4-octet ASN; the regular AGGREGATOR
    // length depends on the negotiated ASN size, which some speakers get
    // wrong. Infer from the attribute length when it disagrees.
    let asn_len = match (input.remaining(), asn_len) {
        (6, AsnLength::Bits16) | (8, AsnLength::Bits16) => {
            if input.remaining() == 8 {
                AsnLength::Bits32
            } else {
                AsnLength::Bits16
            }
        }
        (_, l) => l,
    };
    let asn = input.read_asn(asn_len)?;
    let id = input.read_ipv4_address()?;
    Ok((asn, id))
}
