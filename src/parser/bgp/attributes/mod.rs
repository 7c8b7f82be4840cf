mod attr_01_origin;
mod attr_02_17_as_path;
mod attr_03_next_hop;
mod attr_04_med;
mod attr_05_local_pref;
mod attr_07_18_aggregator;
mod attr_08_communities;
mod attr_09_originator;
mod attr_10_cluster;
mod attr_14_15_nlri;
mod attr_32_large_communities;

use log::{debug, warn};

use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;

use attr_01_origin::parse_origin;
use attr_02_17_as_path::parse_as_path;
use attr_03_next_hop::parse_next_hop;
use attr_04_med::parse_med;
use attr_05_local_pref::parse_local_pref;
use attr_07_18_aggregator::parse_aggregator;
use attr_08_communities::parse_regular_communities;
use attr_09_originator::parse_originator_id;
use attr_10_cluster::parse_clusters;
use attr_14_15_nlri::parse_nlri;
use attr_32_large_communities::parse_large_communities;

pub(crate) use attr_03_next_hop::parse_mp_next_hop;

/// Parse the attribute section of one BGP UPDATE.
///
/// `data` covers the entirety of the attribute bytes. Unknown and
/// deprecated attribute types are preserved as raw bytes; an attribute that
/// fails to parse is logged and skipped rather than failing the message.
pub fn parse_attributes(
    mut data: &[u8],
    asn_len: AsnLength,
    add_path: bool,
) -> Result<Attributes, ParserError> {
    let mut attributes: Vec<Attribute> = Vec::with_capacity(20);

    // each attribute is at least 3 bytes: flag(1) + type(1) + length(1)
    while data.remaining() >= 3 {
        let flag = AttrFlags::from_bits_retain(data.read_u8()?);
        let attr_type = data.read_u8()?;
        let attr_length = match flag.contains(AttrFlags::EXTENDED) {
            false => data.read_u8()? as usize,
            true => data.read_u16()? as usize,
        };

        debug!("reading attribute: type -- {attr_type:?}, length -- {attr_length}");

        let attr_type = match AttrType::from(attr_type) {
            attr_type @ AttrType::Unknown(unknown_type) => {
                let bytes = data.read_n_bytes(attr_length)?;
                let attr_value = match get_deprecated_attr_type(unknown_type) {
                    Some(t) => {
                        debug!("deprecated attribute type: {unknown_type} - {t}");
                        AttributeValue::Deprecated(AttrRaw { attr_type, bytes })
                    }
                    None => {
                        debug!("unknown attribute type: {unknown_type}");
                        AttributeValue::Unknown(AttrRaw { attr_type, bytes })
                    }
                };
                attributes.push(Attribute {
                    value: attr_value,
                    flag,
                });
                continue;
            }
            t => t,
        };

        if data.remaining() < attr_length {
            warn!(
                "not enough bytes: input bytes left - {}, want to read - {}; skipping",
                data.remaining(),
                attr_length
            );
            // break and return the already parsed attributes
            break;
        }

        let attr_data = data.split_to(attr_length)?;

        let attr = match attr_type {
            AttrType::ORIGIN => parse_origin(attr_data),
            AttrType::AS_PATH => parse_as_path(attr_data, asn_len).map(|path| {
                AttributeValue::AsPath {
                    path,
                    is_as4: false,
                }
            }),
            AttrType::NEXT_HOP => parse_next_hop(attr_data),
            AttrType::MULTI_EXIT_DISCRIMINATOR => parse_med(attr_data),
            AttrType::LOCAL_PREFERENCE => parse_local_pref(attr_data),
            AttrType::ATOMIC_AGGREGATE => Ok(AttributeValue::AtomicAggregate),
            AttrType::AGGREGATOR => {
                parse_aggregator(attr_data, asn_len).map(|(asn, id)| AttributeValue::Aggregator {
                    asn,
                    id,
                    is_as4: false,
                })
            }
            AttrType::ORIGINATOR_ID => parse_originator_id(attr_data),
            AttrType::CLUSTER_LIST => parse_clusters(attr_data),
            AttrType::MP_REACHABLE_NLRI => parse_nlri(attr_data, true, add_path),
            AttrType::MP_UNREACHABLE_NLRI => parse_nlri(attr_data, false, add_path),
            AttrType::AS4_PATH => parse_as_path(attr_data, AsnLength::Bits32)
                .map(|path| AttributeValue::AsPath { path, is_as4: true }),
            AttrType::AS4_AGGREGATOR => parse_aggregator(attr_data, AsnLength::Bits32).map(
                |(asn, id)| AttributeValue::Aggregator {
                    asn,
                    id,
                    is_as4: true,
                },
            ),
            AttrType::COMMUNITIES => parse_regular_communities(attr_data),
            AttrType::LARGE_COMMUNITIES => parse_large_communities(attr_data),
            _ => Err(ParserError::Unsupported(format!(
                "unsupported attribute type: {attr_type:?}"
            ))),
        };

        match attr {
            Ok(value) => attributes.push(Attribute { value, flag }),
            Err(e) => {
                if flag.contains(AttrFlags::PARTIAL) {
                    // partial attributes are allowed to carry bad bytes
                    warn!("PARTIAL: {e}");
                } else {
                    warn!("{e}");
                }
                continue;
            }
        };
    }

    Ok(Attributes::from(attributes))
}
