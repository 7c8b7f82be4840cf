//! Per-connection peer registry: maps a peer's wire identity to the state
//! that must survive between messages, most importantly the capability
//! results negotiated at PEER_UP and consumed by later UPDATE decodes.

use crate::models::{Afi, Safi};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

/// Registry key: peer address plus route distinguisher. Unique within a
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerKey {
    pub addr: IpAddr,
    pub rd: u64,
}

/// Mutable per-peer state owned by the registry and lent to the BGP
/// payload handler for the duration of one dispatch iteration.
#[derive(Debug, Clone)]
pub struct PeerInfo {
    pub peer_hash_str: String,
    pub router_addr: String,
    pub peer_addr: String,
    /// Whether the peer FIRST record went out already.
    pub first_emitted: bool,
    /// Both sides advertised 4-octet ASN support in their OPENs.
    pub four_octet_asn: bool,
    /// Address families for which the router will receive ADD-PATH
    /// encoded NLRI from this peer.
    pub add_path_receive: HashMap<(Afi, Safi), bool>,
}

impl Default for PeerInfo {
    fn default() -> Self {
        PeerInfo {
            peer_hash_str: String::new(),
            router_addr: String::new(),
            peer_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED).to_string(),
            first_emitted: false,
            four_octet_asn: false,
            add_path_receive: HashMap::new(),
        }
    }
}

impl PeerInfo {
    /// Refresh the stored printable peer hash from its raw form.
    pub fn update_hash(&mut self, hash: &[u8; 16]) {
        self.peer_hash_str = crate::collector::records::hash_to_str(hash);
    }

    pub fn add_path_enabled(&self, afi: Afi, safi: Safi) -> bool {
        self.add_path_receive
            .get(&(afi, safi))
            .copied()
            .unwrap_or(false)
    }
}

/// The registry itself. Single threaded, owned by one connection reader,
/// dropped with it.
#[derive(Debug, Default)]
pub struct PeerMap {
    map: HashMap<PeerKey, PeerInfo>,
}

impl PeerMap {
    pub fn get_or_create(&mut self, addr: IpAddr, rd: u64) -> &mut PeerInfo {
        self.map.entry(PeerKey { addr, rd }).or_default()
    }

    pub fn get(&self, addr: IpAddr, rd: u64) -> Option<&PeerInfo> {
        self.map.get(&PeerKey { addr, rd })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_stable() {
        let mut map = PeerMap::default();
        let addr: IpAddr = "10.0.0.1".parse().unwrap();

        map.get_or_create(addr, 0).first_emitted = true;
        assert!(map.get_or_create(addr, 0).first_emitted);
        assert_eq!(map.len(), 1);

        // different RD is a different peer
        assert!(!map.get_or_create(addr, 7).first_emitted);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_add_path_lookup_defaults_off() {
        let mut map = PeerMap::default();
        let addr: IpAddr = "10.0.0.1".parse().unwrap();
        let info = map.get_or_create(addr, 0);
        assert!(!info.add_path_enabled(Afi::Ipv4, Safi::Unicast));

        info.add_path_receive.insert((Afi::Ipv4, Safi::Unicast), true);
        assert!(info.add_path_enabled(Afi::Ipv4, Safi::Unicast));
        assert!(!info.add_path_enabled(Afi::Ipv6, Safi::Unicast));
    }
}
