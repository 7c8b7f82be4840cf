//! The canonical intermediate form between decoding and bus emission: a
//! per-entity container of field name to value-list mappings.

use std::collections::BTreeMap;

/// Router-scoped fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RouterField {
    HashId,
    Ip,
    Name,
    Descr,
    InitData,
}

impl RouterField {
    pub const fn name(&self) -> &'static str {
        match self {
            RouterField::HashId => "router_hash_id",
            RouterField::Ip => "router_ip",
            RouterField::Name => "router_name",
            RouterField::Descr => "router_descr",
            RouterField::InitData => "router_init_data",
        }
    }
}

/// Peer-scoped fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeerField {
    HashId,
    Addr,
    Rd,
    BgpId,
    Asn,
    Timestamp,
}

impl PeerField {
    pub const fn name(&self) -> &'static str {
        match self {
            PeerField::HashId => "peer_hash_id",
            PeerField::Addr => "peer_addr",
            PeerField::Rd => "peer_rd",
            PeerField::BgpId => "peer_bgp_id",
            PeerField::Asn => "peer_asn",
            PeerField::Timestamp => "peer_timestamp",
        }
    }
}

/// Attribute fields of one decoded UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AttrField {
    Origin,
    AsPath,
    AsPathCount,
    OriginAs,
    NextHop,
    Med,
    LocalPref,
    Aggregator,
    CommunityList,
    LargeCommunityList,
    OriginatorId,
    ClusterList,
    AtomicAgg,
    IsNexthopIpv4,
}

impl AttrField {
    pub const fn name(&self) -> &'static str {
        match self {
            AttrField::Origin => "origin",
            AttrField::AsPath => "as_path",
            AttrField::AsPathCount => "as_path_count",
            AttrField::OriginAs => "origin_as",
            AttrField::NextHop => "next_hop",
            AttrField::Med => "med",
            AttrField::LocalPref => "local_pref",
            AttrField::Aggregator => "aggregator",
            AttrField::CommunityList => "community_list",
            AttrField::LargeCommunityList => "large_community_list",
            AttrField::OriginatorId => "originator_id",
            AttrField::ClusterList => "cluster_list",
            AttrField::AtomicAgg => "atomic_agg",
            AttrField::IsNexthopIpv4 => "is_nexthop_ipv4",
        }
    }
}

/// One NLRI entry of a decoded UPDATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixEntry {
    pub prefix: String,
    pub len: u8,
    pub path_id: u32,
    pub is_ipv4: bool,
}

/// Per-field name-to-values container filled while decoding one message
/// and handed to the bus for templated emissions.
#[derive(Debug, Clone, Default)]
pub struct DecodedUpdate {
    pub router: BTreeMap<RouterField, Vec<String>>,
    pub peer: BTreeMap<PeerField, Vec<String>>,
    pub attrs: BTreeMap<AttrField, Vec<String>>,
    pub announced: Vec<PrefixEntry>,
    pub withdrawn: Vec<PrefixEntry>,
}

impl DecodedUpdate {
    pub fn push_router(&mut self, field: RouterField, value: String) {
        self.router.entry(field).or_default().push(value);
    }

    pub fn push_peer(&mut self, field: PeerField, value: String) {
        self.peer.entry(field).or_default().push(value);
    }

    pub fn push_attr(&mut self, field: AttrField, value: String) {
        self.attrs.entry(field).or_default().push(value);
    }

    pub fn router_value(&self, field: RouterField) -> Option<&str> {
        self.router
            .get(&field)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn peer_value(&self, field: PeerField) -> Option<&str> {
        self.peer
            .get(&field)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn attr_value(&self, field: AttrField) -> Option<&str> {
        self.attrs
            .get(&field)
            .and_then(|v| v.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lists_accumulate() {
        let mut update = DecodedUpdate::default();
        update.push_attr(AttrField::CommunityList, "65000:1".to_string());
        update.push_attr(AttrField::CommunityList, "65000:2".to_string());
        assert_eq!(update.attrs[&AttrField::CommunityList].len(), 2);
        assert_eq!(update.attr_value(AttrField::CommunityList), Some("65000:1"));
    }

    #[test]
    fn test_field_names() {
        assert_eq!(RouterField::HashId.name(), "router_hash_id");
        assert_eq!(PeerField::Rd.name(), "peer_rd");
        assert_eq!(AttrField::NextHop.name(), "next_hop");
    }
}
