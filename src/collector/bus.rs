//! The downstream message-bus interface consumed by the reader. The bus
//! transport itself lives outside this crate; implementations must be
//! thread safe because every connection worker holds a reference.

use crate::collector::records::{hash_to_str, PeerDownEvent, PeerRecord, PeerUpEvent, RouterRecord};
use crate::collector::template::TemplateEntry;
use crate::collector::update::DecodedUpdate;
use crate::parser::bmp::StatsReport;
use bytes::Bytes;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterAction {
    /// First sight of the router on this connection.
    First,
    /// BMP Initiation message decoded.
    Init,
    /// Protocol termination or local connection failure.
    Term,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerAction {
    First,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixAction {
    Add,
    Del,
}

/// A bus emission the transport could not take. Fatal to the connection.
#[derive(Debug)]
pub struct BusError(pub String);

impl Display for BusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for BusError {}

/// Action-typed write interface of the message bus.
pub trait MessageBus: Send + Sync {
    fn update_router(&self, router: &RouterRecord, action: RouterAction) -> Result<(), BusError>;

    /// Emitted in addition to [`MessageBus::update_router`] when the
    /// template map carries a router binding.
    fn update_router_templated(
        &self,
        fields: &DecodedUpdate,
        action: RouterAction,
        template: &TemplateEntry,
    ) -> Result<(), BusError>;

    fn update_peer(
        &self,
        peer: &PeerRecord,
        up_event: Option<&PeerUpEvent>,
        down_event: Option<&PeerDownEvent>,
        action: PeerAction,
    ) -> Result<(), BusError>;

    /// Decoded ROUTE_MONITORING content: announced prefixes with `Add`,
    /// withdrawn prefixes with `Del`.
    fn update_unicast_prefix(
        &self,
        peer: &PeerRecord,
        update: &DecodedUpdate,
        action: PrefixAction,
        template: Option<&TemplateEntry>,
    ) -> Result<(), BusError>;

    fn add_stat_report(&self, peer: &PeerRecord, stats: &StatsReport) -> Result<(), BusError>;

    /// Verbatim frame fan-out so a consumer can re-stream raw BMP. Emitted
    /// after the typed records of the same message.
    fn send_bmp_raw(
        &self,
        router_hash: &[u8; 16],
        peer: Option<&PeerRecord>,
        frame: &Bytes,
    ) -> Result<(), BusError>;
}

/// A bus that renders every action through `log`. Backs the bundled daemon
/// and doubles as a template for real transports.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBus;

impl MessageBus for LoggingBus {
    fn update_router(&self, router: &RouterRecord, action: RouterAction) -> Result<(), BusError> {
        log::info!(
            "router {:?} hash={} ip={} name={:?} term_reason={}",
            action,
            hash_to_str(&router.hash_id),
            router.ip_addr,
            router.name,
            router.term_reason_code,
        );
        Ok(())
    }

    fn update_router_templated(
        &self,
        fields: &DecodedUpdate,
        action: RouterAction,
        template: &TemplateEntry,
    ) -> Result<(), BusError> {
        log::info!(
            "router-templated {:?} topic={} fields={}",
            action,
            template.topic,
            fields.router.len(),
        );
        Ok(())
    }

    fn update_peer(
        &self,
        peer: &PeerRecord,
        up_event: Option<&PeerUpEvent>,
        down_event: Option<&PeerDownEvent>,
        action: PeerAction,
    ) -> Result<(), BusError> {
        log::info!(
            "peer {:?} hash={} addr={} rd={} asn={} up={} down={}",
            action,
            hash_to_str(&peer.hash_id),
            peer.peer_addr,
            peer.peer_rd,
            peer.peer_as,
            up_event.is_some(),
            down_event.map(|d| d.error_text.as_str()).unwrap_or(""),
        );
        Ok(())
    }

    fn update_unicast_prefix(
        &self,
        peer: &PeerRecord,
        update: &DecodedUpdate,
        action: PrefixAction,
        template: Option<&TemplateEntry>,
    ) -> Result<(), BusError> {
        let prefixes = match action {
            PrefixAction::Add => &update.announced,
            PrefixAction::Del => &update.withdrawn,
        };
        log::info!(
            "unicast-prefix {:?} peer={} count={} templated={}",
            action,
            peer.peer_addr,
            prefixes.len(),
            template.is_some(),
        );
        Ok(())
    }

    fn add_stat_report(&self, peer: &PeerRecord, stats: &StatsReport) -> Result<(), BusError> {
        log::info!(
            "stat-report peer={} counters={}",
            peer.peer_addr,
            stats.counters.len()
        );
        Ok(())
    }

    fn send_bmp_raw(
        &self,
        router_hash: &[u8; 16],
        _peer: Option<&PeerRecord>,
        frame: &Bytes,
    ) -> Result<(), BusError> {
        log::debug!(
            "bmp-raw router={} bytes={}",
            hash_to_str(router_hash),
            frame.len()
        );
        Ok(())
    }
}
