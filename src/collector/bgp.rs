//! Per-message BGP payload handler. Constructed fresh for each PEER_UP,
//! PEER_DOWN, and ROUTE_MONITORING dispatch; reads and writes the peer's
//! registry entry, and emits decoded route content on the bus.

use crate::collector::bus::{MessageBus, PrefixAction};
use crate::collector::records::{PeerDownEvent, PeerRecord, PeerUpEvent};
use crate::collector::registry::PeerInfo;
use crate::collector::template::{TemplateMap, TemplateTopic};
use crate::collector::update::{AttrField, DecodedUpdate, PrefixEntry};
use crate::error::ReaderError;
use crate::models::*;
use crate::parser::bgp::messages::parse_bgp_message;
use crate::parser::ReadUtils;
use ipnet::IpNet;
use log::{debug, info, warn};

pub(crate) struct BgpHandler<'a> {
    bus: &'a dyn MessageBus,
    peer: &'a PeerRecord,
    router_addr: &'a str,
    peer_info: &'a mut PeerInfo,
    debug: bool,
}

impl<'a> BgpHandler<'a> {
    pub(crate) fn new(
        bus: &'a dyn MessageBus,
        peer: &'a PeerRecord,
        router_addr: &'a str,
        peer_info: &'a mut PeerInfo,
        debug: bool,
    ) -> Self {
        BgpHandler {
            bus,
            peer,
            router_addr,
            peer_info,
            debug,
        }
    }

    /// Decode the sent and received OPEN messages of a PEER_UP body and
    /// record the negotiated capability state on the registry entry.
    ///
    /// Some routers omit the OPEN pair entirely; capability state is then
    /// left at its defaults.
    pub(crate) fn handle_up_event(
        &mut self,
        mut data: &[u8],
        up_event: &mut PeerUpEvent,
    ) -> Result<(), ReaderError> {
        if data.remaining() == 0 {
            warn!(
                "{}: PEER UP for {} carries no OPEN messages",
                self.router_addr, self.peer.peer_addr
            );
            return Ok(());
        }

        let sent = self.expect_open(parse_bgp_message(&mut data, false, AsnLength::Bits32)?)?;
        let received = self.expect_open(parse_bgp_message(&mut data, false, AsnLength::Bits32)?)?;

        self.record_capabilities(&sent, &received);

        // trailing information TLVs
        while data.remaining() >= 4 {
            let info_type = data.read_u16()?;
            let info_len = data.read_u16()?;
            let value = data.read_n_bytes_to_string(info_len as usize)?;
            debug!(
                "{}: PEER UP information TLV type={info_type} value={value}",
                self.router_addr
            );
            up_event.info_data.push(value);
        }

        up_event.sent_open = Some(sent);
        up_event.received_open = Some(received);
        Ok(())
    }

    /// Decode the NOTIFICATION PDU of a PEER_DOWN body and append its
    /// rendered text to the event's error text.
    pub(crate) fn handle_down_event(
        &mut self,
        mut data: &[u8],
        down_event: &mut PeerDownEvent,
    ) -> Result<(), ReaderError> {
        let msg = parse_bgp_message(&mut data, false, AsnLength::Bits32)?;
        let notification = match msg {
            BgpMessage::Notification(notification) => notification,
            other => {
                return Err(ReaderError::Malformed(format!(
                    "PEER DOWN carried a {:?} instead of a NOTIFICATION",
                    other.msg_type()
                )))
            }
        };
        down_event.error_text.push_str(&notification.error.to_string());
        down_event.notification = Some(notification);
        Ok(())
    }

    /// Decode a ROUTE_MONITORING body as a BGP UPDATE, fill the decoded
    /// update container, and emit the prefix actions.
    pub(crate) fn handle_update(
        &mut self,
        mut data: &[u8],
        templates: &TemplateMap,
        update: &mut DecodedUpdate,
    ) -> Result<(), ReaderError> {
        // The per-peer header A flag fixes the AS_PATH encoding; ADD-PATH
        // state comes from the OPENs recorded at PEER_UP.
        let asn_len = if self.peer.is_two_octet_asn {
            AsnLength::Bits16
        } else {
            AsnLength::Bits32
        };
        let add_path = self.peer_info.add_path_enabled(Afi::Ipv4, Safi::Unicast)
            || self.peer_info.add_path_enabled(Afi::Ipv6, Safi::Unicast);

        let msg = parse_bgp_message(&mut data, add_path, asn_len)?;
        let bgp_update = match msg {
            BgpMessage::Update(bgp_update) => bgp_update,
            other => {
                return Err(ReaderError::Malformed(format!(
                    "route monitoring carried a {:?} instead of an UPDATE",
                    other.msg_type()
                )))
            }
        };

        if self.debug {
            debug!(
                "{}: UPDATE from {}: {} announced, {} withdrawn",
                self.router_addr,
                self.peer.peer_addr,
                bgp_update.announced_prefixes.len(),
                bgp_update.withdrawn_prefixes.len()
            );
        }

        if bgp_update.is_end_of_rib() {
            info!(
                "{}: End-of-RIB from peer {}",
                self.router_addr, self.peer.peer_addr
            );
            return Ok(());
        }

        self.fill_attr_fields(&bgp_update.attributes, update);

        for prefix in &bgp_update.announced_prefixes {
            update.announced.push(prefix_entry(prefix));
        }
        for prefix in &bgp_update.withdrawn_prefixes {
            update.withdrawn.push(prefix_entry(prefix));
        }
        if let Some(nlri) = bgp_update.attributes.get_reachable_nlri() {
            for prefix in &nlri.prefixes {
                update.announced.push(prefix_entry(prefix));
            }
        }
        if let Some(nlri) = bgp_update.attributes.get_unreachable_nlri() {
            for prefix in &nlri.prefixes {
                update.withdrawn.push(prefix_entry(prefix));
            }
        }

        let template = templates.get(TemplateTopic::UnicastPrefix);
        if !update.announced.is_empty() {
            self.bus
                .update_unicast_prefix(self.peer, update, PrefixAction::Add, template)
                .map_err(|e| ReaderError::Bus(e.to_string()))?;
        }
        if !update.withdrawn.is_empty() {
            self.bus
                .update_unicast_prefix(self.peer, update, PrefixAction::Del, template)
                .map_err(|e| ReaderError::Bus(e.to_string()))?;
        }
        Ok(())
    }

    fn expect_open(&self, msg: BgpMessage) -> Result<BgpOpenMessage, ReaderError> {
        match msg {
            BgpMessage::Open(open) => Ok(open),
            other => Err(ReaderError::Malformed(format!(
                "PEER UP carried a {:?} instead of an OPEN",
                other.msg_type()
            ))),
        }
    }

    /// The updates the router forwards were received from the peer, so a
    /// capability is live when the peer offered it in its OPEN and the
    /// router accepted it in the sent OPEN.
    fn record_capabilities(&mut self, sent: &BgpOpenMessage, received: &BgpOpenMessage) {
        let sent_four_octet = has_four_octet_asn(sent);
        let received_four_octet = has_four_octet_asn(received);
        self.peer_info.four_octet_asn = sent_four_octet && received_four_octet;

        for (family, direction) in add_path_families(received) {
            if !direction.can_send() {
                continue;
            }
            let local_receives = add_path_families(sent)
                .any(|(f, d)| f == family && d.can_receive());
            if local_receives {
                debug!(
                    "{}: peer {} negotiated ADD-PATH for {:?}",
                    self.router_addr, self.peer.peer_addr, family
                );
                self.peer_info.add_path_receive.insert(family, true);
            }
        }
    }

    /// Flatten the attribute list into the decoded update's field lists.
    fn fill_attr_fields(&self, attrs: &Attributes, update: &mut DecodedUpdate) {
        update.push_attr(AttrField::Origin, attrs.origin().to_string());

        if let Some(path) = attrs.as_path() {
            update.push_attr(AttrField::AsPath, path.to_string());
            update.push_attr(AttrField::AsPathCount, path.count_asns().to_string());
            if let Some(origins) = path.get_origin() {
                for asn in origins {
                    update.push_attr(AttrField::OriginAs, asn.to_string());
                }
            }
        }

        let next_hop = attrs.next_hop().map(|addr| addr.to_string()).or_else(|| {
            attrs
                .get_reachable_nlri()
                .and_then(|nlri| nlri.next_hop.as_ref())
                .map(|hop| hop.to_string())
        });
        if let Some(next_hop) = next_hop {
            update.push_attr(AttrField::IsNexthopIpv4, (!next_hop.contains(':')).to_string());
            update.push_attr(AttrField::NextHop, next_hop);
        }

        if let Some(med) = attrs.multi_exit_discriminator() {
            update.push_attr(AttrField::Med, med.to_string());
        }
        if let Some(local_pref) = attrs.local_preference() {
            update.push_attr(AttrField::LocalPref, local_pref.to_string());
        }
        update.push_attr(
            AttrField::AtomicAgg,
            if attrs.atomic_aggregate() { "1" } else { "0" }.to_string(),
        );
        if let Some((asn, id)) = attrs.aggregator() {
            update.push_attr(AttrField::Aggregator, format!("{asn} {id}"));
        }
        if let Some(communities) = attrs.communities() {
            for community in communities {
                update.push_attr(AttrField::CommunityList, community.to_string());
            }
        }
        if let Some(communities) = attrs.large_communities() {
            for community in communities {
                update.push_attr(AttrField::LargeCommunityList, community.to_string());
            }
        }
        if let Some(id) = attrs.originator_id() {
            update.push_attr(AttrField::OriginatorId, id.to_string());
        }
        if let Some(clusters) = attrs.clusters() {
            for cluster in clusters {
                update.push_attr(
                    AttrField::ClusterList,
                    std::net::Ipv4Addr::from(*cluster).to_string(),
                );
            }
        }
    }
}

fn has_four_octet_asn(open: &BgpOpenMessage) -> bool {
    open.capabilities()
        .any(|c| c.ty == BgpCapabilityType::SUPPORT_FOR_4_OCTET_AS_NUMBER_CAPABILITY)
}

/// ADD-PATH capability value: repeating (AFI, SAFI, direction) triples.
fn add_path_families(
    open: &BgpOpenMessage,
) -> impl Iterator<Item = ((Afi, Safi), AddPathDirection)> + '_ {
    open.capabilities()
        .filter(|c| c.ty == BgpCapabilityType::ADD_PATH_CAPABILITY)
        .flat_map(|c| c.value.chunks_exact(4))
        .filter_map(|chunk| {
            let afi = Afi::try_from(u16::from_be_bytes([chunk[0], chunk[1]])).ok()?;
            let safi = Safi::try_from(chunk[2]).ok()?;
            let direction = AddPathDirection::try_from_u8(chunk[3])?;
            Some(((afi, safi), direction))
        })
}

fn prefix_entry(prefix: &NetworkPrefix) -> PrefixEntry {
    PrefixEntry {
        prefix: prefix.addr().to_string(),
        len: prefix.prefix_len(),
        path_id: prefix.path_id,
        is_ipv4: matches!(prefix.prefix, IpNet::V4(_)),
    }
}
