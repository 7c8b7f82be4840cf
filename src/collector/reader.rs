//! The connection state machine: one reader per accepted BMP session,
//! driving framing, identity bookkeeping, per-type dispatch, and bus
//! emission until the router terminates or the stream dies.

use crate::collector::bgp::BgpHandler;
use crate::collector::bus::{BusError, MessageBus, PeerAction, RouterAction};
use crate::collector::framer::Framer;
use crate::collector::records::{PeerDownEvent, PeerRecord, PeerUpEvent, RouterRecord};
use crate::collector::registry::PeerMap;
use crate::collector::template::{TemplateMap, TemplateTopic};
use crate::collector::update::{DecodedUpdate, PeerField, RouterField};
use crate::collector::{
    hash_to_str, ClientInfo, CollectorConfig, TERM_REASON_OPENBMP_CONN_ERR,
};
use crate::error::ReaderError;
use crate::parser::ReadUtils;
use crate::parser::bmp::{
    parse_initiation_message, parse_peer_down_notification, parse_peer_up_header,
    parse_per_peer_header, parse_stats_report, parse_termination_message, BmpMsgType,
    PEER_DOWN_LOCAL_NOTIFY, PEER_DOWN_LOCAL_NO_NOTIFY, PEER_DOWN_REMOTE_NOTIFY,
};
use log::{debug, info, warn};
use std::io::Read;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};

/// What the dispatcher decided about the connection after one message.
enum Dispatch {
    /// Keep reading.
    Continue,
    /// Orderly protocol termination: nothing more to read.
    Done,
}

/// Reads one router's BMP stream and forwards typed records to the bus.
///
/// The reader owns the per-connection state: the peer registry and the
/// router FIRST bookkeeping. The input source is borrowed per [`run`]
/// call so the supervisor can hand in the raw socket or a pipe; closing
/// the source on exit is the supervisor's job.
///
/// [`run`]: BmpReader::run
pub struct BmpReader {
    client: ClientInfo,
    config: CollectorConfig,
    peer_map: PeerMap,
    router_seeded: bool,
}

impl BmpReader {
    pub fn new(client: ClientInfo, config: CollectorConfig) -> Self {
        BmpReader {
            client,
            config,
            peer_map: PeerMap::default(),
            router_seeded: false,
        }
    }

    pub const fn client(&self) -> &ClientInfo {
        &self.client
    }

    /// Drive the connection until orderly termination, stop request, or
    /// failure.
    ///
    /// The stop signal is polled only between messages; mid-message
    /// cancellation would desynchronize the framer. A stop observed at a
    /// loop boundary returns cleanly with no synthetic TERM (shutdown-time
    /// records are the supervisor's call). Every error path emits exactly
    /// one synthetic router TERM before returning.
    pub fn run<R: Read>(
        &mut self,
        source: &mut R,
        bus: &dyn MessageBus,
        templates: &TemplateMap,
        stop: &AtomicBool,
    ) -> Result<(), ReaderError> {
        loop {
            if stop.load(Ordering::Relaxed) {
                info!("{}: stop requested, leaving reader loop", self.client.addr);
                return Ok(());
            }
            match self.read_incoming_msg(source, bus, templates) {
                Ok(Dispatch::Continue) => {}
                Ok(Dispatch::Done) => return Ok(()),
                Err(err) => {
                    info!("{}: {err}", self.client.addr);
                    self.disconnect(bus, TERM_REASON_OPENBMP_CONN_ERR, &err.to_string());
                    return Err(err);
                }
            }
        }
    }

    /// Frame, decode, and dispatch exactly one BMP message.
    fn read_incoming_msg<R: Read>(
        &mut self,
        source: &mut R,
        bus: &dyn MessageBus,
        templates: &TemplateMap,
    ) -> Result<Dispatch, ReaderError> {
        let frame = Framer::read_frame(source)?;
        let msg_type = frame.header.msg_type;
        let mut body = frame.body();
        let router_addr = self.client.addr.to_string();

        if self.config.debug_bmp {
            debug!(
                "{router_addr}: BMP {msg_type:?} message, {} bytes",
                frame.header.msg_len
            );
        }

        let mut update = DecodedUpdate::default();
        update.push_router(RouterField::HashId, hash_to_str(&self.client.hash_id));
        update.push_router(RouterField::Ip, router_addr.clone());

        let mut router = RouterRecord::new(self.client.hash_id, router_addr.clone());

        // Seed the router exactly once per connection, triggered by the
        // first message that is not an Initiation (which emits Init below).
        if msg_type != BmpMsgType::InitiationMessage && !self.router_seeded {
            bus.update_router(&router, RouterAction::First)
                .map_err(bus_err)?;
            self.router_seeded = true;
        }

        // Seed the peer context when a per-peer header is present.
        let mut peer: Option<PeerRecord> = None;
        let mut peer_key: Option<(IpAddr, u64)> = None;
        if msg_type.has_per_peer_header() {
            let peer_header = parse_per_peer_header(&mut body)?;
            let record = PeerRecord::from_header(&peer_header, self.client.hash_id);

            let info = self
                .peer_map
                .get_or_create(peer_header.peer_ip, peer_header.peer_distinguisher.as_u64());
            info.update_hash(&record.hash_id);
            info.router_addr = router_addr.clone();
            info.peer_addr = record.peer_addr.clone();

            update.push_peer(PeerField::HashId, info.peer_hash_str.clone());
            update.push_peer(PeerField::Addr, record.peer_addr.clone());
            update.push_peer(PeerField::Rd, record.peer_rd.clone());
            update.push_peer(PeerField::BgpId, record.peer_bgp_id.to_string());
            update.push_peer(PeerField::Asn, record.peer_as.to_string());
            update.push_peer(
                PeerField::Timestamp,
                format!("{}.{:06}", record.ts_secs, record.ts_usecs),
            );

            // PEER_UP implies FIRST through its own Up emission.
            if msg_type != BmpMsgType::PeerUpNotification && !info.first_emitted {
                bus.update_peer(&record, None, None, PeerAction::First)
                    .map_err(bus_err)?;
                info.first_emitted = true;
            }

            peer_key = Some((peer_header.peer_ip, peer_header.peer_distinguisher.as_u64()));
            peer = Some(record);
        }

        let dispatch = match msg_type {
            BmpMsgType::InitiationMessage => {
                let init = parse_initiation_message(&mut body)?;
                info!(
                    "{router_addr}: Init message received with length of {}",
                    frame.header.msg_len
                );

                router.name = init.sys_name().map(str::to_string);
                router.descr = init.sys_descr().map(str::to_string);
                router.init_data = init.free_form_info().map(str::to_string).collect();

                if let Some(name) = &router.name {
                    update.push_router(RouterField::Name, name.clone());
                }
                if let Some(descr) = &router.descr {
                    update.push_router(RouterField::Descr, descr.clone());
                }
                for data in &router.init_data {
                    update.push_router(RouterField::InitData, data.clone());
                }

                bus.update_router(&router, RouterAction::Init).map_err(bus_err)?;
                self.router_seeded = true;
                if let Some(template) = templates.get(TemplateTopic::Router) {
                    bus.update_router_templated(&update, RouterAction::Init, template)
                        .map_err(bus_err)?;
                }
                Dispatch::Continue
            }

            BmpMsgType::TerminationMessage => {
                let term = parse_termination_message(&mut body)?;
                info!(
                    "{router_addr}: Term message received with length of {}",
                    frame.header.msg_len
                );

                router.set_term_reason(
                    term.reason_code().unwrap_or(0),
                    term.reason_text().unwrap_or(""),
                );
                bus.update_router(&router, RouterAction::Term).map_err(bus_err)?;
                info!("{router_addr}: proceeding to disconnect router");
                Dispatch::Done
            }

            BmpMsgType::PeerUpNotification => {
                self.handle_peer_up(&router_addr, body, bus, &peer, &peer_key)?
            }

            BmpMsgType::PeerDownNotification => {
                self.handle_peer_down(&router_addr, body, bus, &peer, &peer_key)?
            }

            BmpMsgType::RouteMonitoring => {
                let (record, key) = expect_peer(&peer, &peer_key)?;
                let info = self.peer_map.get_or_create(key.0, key.1);
                let mut handler =
                    BgpHandler::new(bus, record, &router_addr, info, self.config.debug_bgp);
                handler.handle_update(body, templates, &mut update)?;
                Dispatch::Continue
            }

            BmpMsgType::StatisticsReport => {
                let (record, _) = expect_peer(&peer, &peer_key)?;
                let stats = parse_stats_report(&mut body)?;
                bus.add_stat_report(record, &stats).map_err(bus_err)?;
                Dispatch::Continue
            }
        };

        // Raw fan-out goes last so consumers see typed records first.
        bus.send_bmp_raw(&self.client.hash_id, peer.as_ref(), frame.as_bytes())
            .map_err(bus_err)?;

        Ok(dispatch)
    }

    fn handle_peer_up(
        &mut self,
        router_addr: &str,
        mut body: &[u8],
        bus: &dyn MessageBus,
        peer: &Option<PeerRecord>,
        peer_key: &Option<(IpAddr, u64)>,
    ) -> Result<Dispatch, ReaderError> {
        let (record, key) = expect_peer(peer, peer_key)?;

        let header = match parse_peer_up_header(&mut body, &afi_of(record)) {
            Ok(header) => header,
            Err(e) => {
                // A bad up-event header skips this message but does not
                // kill the connection; no Up and no First go out for it.
                warn!("{router_addr}: PEER UP received but failed to parse the event header: {e}");
                return Ok(Dispatch::Continue);
            }
        };

        info!(
            "{router_addr}: PEER UP received, local addr={}:{} remote addr={}:{}",
            header.local_addr, header.local_port, record.peer_addr, header.remote_port
        );

        let mut up_event = PeerUpEvent::from(header);
        {
            let info = self.peer_map.get_or_create(key.0, key.1);
            let mut handler =
                BgpHandler::new(bus, record, router_addr, info, self.config.debug_bgp);
            handler.handle_up_event(body, &mut up_event)?;
        }
        // Up implies First for this peer.
        self.peer_map.get_or_create(key.0, key.1).first_emitted = true;

        bus.update_peer(record, Some(&up_event), None, PeerAction::Up)
            .map_err(bus_err)?;
        Ok(Dispatch::Continue)
    }

    fn handle_peer_down(
        &mut self,
        router_addr: &str,
        mut body: &[u8],
        bus: &dyn MessageBus,
        peer: &Option<PeerRecord>,
        peer_key: &Option<(IpAddr, u64)>,
    ) -> Result<Dispatch, ReaderError> {
        let (record, key) = expect_peer(peer, peer_key)?;

        // A failure to read the down-event header is fatal.
        let down = parse_peer_down_notification(&mut body)?;
        let mut down_event = PeerDownEvent {
            reason: down.reason,
            ..Default::default()
        };

        match down.reason {
            PEER_DOWN_LOCAL_NOTIFY => {
                down_event.error_text = format!(
                    "Local close by ({router_addr}) for peer ({}) : ",
                    record.peer_addr
                );
                let data = down.data.as_deref().unwrap_or(&[]);
                let info = self.peer_map.get_or_create(key.0, key.1);
                let mut handler =
                    BgpHandler::new(bus, record, router_addr, info, self.config.debug_bgp);
                handler.handle_down_event(data, &mut down_event)?;
            }
            PEER_DOWN_LOCAL_NO_NOTIFY => {
                // Two byte big-endian code for the FSM event that closed
                // the session; 0 when the router gave none.
                let mut data = down.data.as_deref().unwrap_or(&[]);
                let fsm_event = data.read_u16().unwrap_or(0);
                down_event.fsm_event = Some(fsm_event);
                down_event.error_text = format!(
                    "Local ({router_addr}) closed peer ({}) session: fsm_event={fsm_event}, No BGP notify message.",
                    record.peer_addr
                );
            }
            PEER_DOWN_REMOTE_NOTIFY => {
                down_event.error_text = format!(
                    "Remote peer ({}) closed local ({router_addr}) session: ",
                    record.peer_addr
                );
                let data = down.data.as_deref().unwrap_or(&[]);
                let info = self.peer_map.get_or_create(key.0, key.1);
                let mut handler =
                    BgpHandler::new(bus, record, router_addr, info, self.config.debug_bgp);
                handler.handle_down_event(data, &mut down_event)?;
            }
            _ => {
                // remote close without notification, peer de-configured,
                // or an unassigned code: no payload to decode
            }
        }

        bus.update_peer(record, None, Some(&down_event), PeerAction::Down)
            .map_err(bus_err)?;
        Ok(Dispatch::Continue)
    }

    /// Mark the router as disconnected with a local reason. Used on every
    /// fatal error path; a bus refusal at this point can only be logged.
    fn disconnect(&mut self, bus: &dyn MessageBus, reason_code: u16, reason_text: &str) {
        let mut router =
            RouterRecord::new(self.client.hash_id, self.client.addr.to_string());
        router.set_term_reason(reason_code, reason_text);
        if let Err(e) = bus.update_router(&router, RouterAction::Term) {
            warn!("{}: bus refused the router TERM: {e}", self.client.addr);
        }
    }
}

fn bus_err(e: BusError) -> ReaderError {
    ReaderError::Bus(e.to_string())
}

/// The per-peer header was already decoded for these message types; its
/// absence here means the dispatch tables disagree with the wire format.
fn expect_peer<'a>(
    peer: &'a Option<PeerRecord>,
    peer_key: &Option<(IpAddr, u64)>,
) -> Result<(&'a PeerRecord, (IpAddr, u64)), ReaderError> {
    match (peer, peer_key) {
        (Some(record), Some(key)) => Ok((record, *key)),
        _ => Err(ReaderError::Malformed(
            "message type requires a per-peer header".to_string(),
        )),
    }
}

fn afi_of(record: &PeerRecord) -> crate::models::Afi {
    if record.is_ipv6 {
        crate::models::Afi::Ipv6
    } else {
        crate::models::Afi::Ipv4
    }
}
