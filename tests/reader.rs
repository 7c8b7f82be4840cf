//! End-to-end connection scenarios: hand-assembled BMP byte streams driven
//! through a reader against a recording bus.

use bmp_collector::collector::{
    BmpReader, BusError, ClientInfo, CollectorConfig, DecodedUpdate, MessageBus, PeerAction,
    PeerDownEvent, PeerRecord, PeerUpEvent, PrefixAction, RouterAction, RouterRecord,
    TemplateEntry, TemplateMap, TemplateTopic, TERM_REASON_OPENBMP_CONN_ERR,
};
use bmp_collector::error::ReaderError;
use bmp_collector::parser::bmp::{StatType, StatsData, StatsReport};
use bytes::Bytes;
use std::io::Cursor;
use std::net::IpAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

const ROUTER_IP: &str = "192.0.2.50";

fn client() -> ClientInfo {
    let addr: IpAddr = ROUTER_IP.parse().unwrap();
    ClientInfo::new(bmp_collector::collector::router_hash(&addr), addr)
}

// ---- wire builders -------------------------------------------------------

fn bmp_frame(msg_type: u8, body: &[u8]) -> Vec<u8> {
    let mut data = vec![3u8];
    data.extend_from_slice(&((6 + body.len()) as u32).to_be_bytes());
    data.push(msg_type);
    data.extend_from_slice(body);
    data
}

fn peer_header(addr_v4: [u8; 4], asn: u32) -> Vec<u8> {
    let mut data = vec![0u8, 0u8]; // global peer, no flags
    data.extend_from_slice(&[0u8; 8]); // rd 0
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(&addr_v4);
    data.extend_from_slice(&asn.to_be_bytes());
    data.extend_from_slice(&[10, 0, 0, 99]); // bgp id
    data.extend_from_slice(&1700000000u32.to_be_bytes());
    data.extend_from_slice(&250u32.to_be_bytes());
    data
}

fn bgp_pdu(msg_type: u8, body: &[u8]) -> Vec<u8> {
    let mut pdu = vec![0xffu8; 16];
    pdu.extend_from_slice(&((19 + body.len()) as u16).to_be_bytes());
    pdu.push(msg_type);
    pdu.extend_from_slice(body);
    pdu
}

fn open_pdu(asn: u16) -> Vec<u8> {
    let mut body = vec![4u8];
    body.extend_from_slice(&asn.to_be_bytes());
    body.extend_from_slice(&180u16.to_be_bytes());
    body.extend_from_slice(&[10, 0, 0, 99]);
    body.push(0); // no optional parameters
    bgp_pdu(1, &body)
}

fn init_msg(sys_name: &str) -> Vec<u8> {
    let mut body = vec![0u8, 2];
    body.extend_from_slice(&(sys_name.len() as u16).to_be_bytes());
    body.extend_from_slice(sys_name.as_bytes());
    bmp_frame(4, &body)
}

fn term_msg(reason: u16) -> Vec<u8> {
    let mut body = vec![0u8, 1, 0, 2];
    body.extend_from_slice(&reason.to_be_bytes());
    bmp_frame(5, &body)
}

fn peer_up_msg(peer: [u8; 4], asn: u32) -> Vec<u8> {
    let mut body = peer_header(peer, asn);
    body.extend_from_slice(&[0u8; 12]);
    body.extend_from_slice(&[10, 0, 0, 99]); // local address
    body.extend_from_slice(&179u16.to_be_bytes());
    body.extend_from_slice(&40000u16.to_be_bytes());
    body.extend_from_slice(&open_pdu(65001));
    body.extend_from_slice(&open_pdu(asn as u16));
    bmp_frame(3, &body)
}

fn route_mon_msg(peer: [u8; 4], asn: u32) -> Vec<u8> {
    // one announced IPv4 prefix 192.0.2.0/24 with mandatory attributes
    let mut attrs = vec![];
    attrs.extend_from_slice(&[0b0100_0000, 1, 1, 0]); // origin IGP
    attrs.extend_from_slice(&[0b0100_0000, 2, 6, 2, 1]);
    attrs.extend_from_slice(&asn.to_be_bytes()); // as path [asn]
    attrs.extend_from_slice(&[0b0100_0000, 3, 4, 10, 0, 0, 9]); // next hop

    let mut update = vec![0u8, 0]; // no withdrawals
    update.extend_from_slice(&(attrs.len() as u16).to_be_bytes());
    update.extend_from_slice(&attrs);
    update.extend_from_slice(&[24, 192, 0, 2]);

    let mut body = peer_header(peer, asn);
    body.extend_from_slice(&bgp_pdu(2, &update));
    bmp_frame(0, &body)
}

fn peer_down_msg(peer: [u8; 4], asn: u32, reason: u8, payload: &[u8]) -> Vec<u8> {
    let mut body = peer_header(peer, asn);
    body.push(reason);
    body.extend_from_slice(payload);
    bmp_frame(2, &body)
}

fn stats_msg(peer: [u8; 4], asn: u32) -> Vec<u8> {
    let mut body = peer_header(peer, asn);
    body.extend_from_slice(&1u32.to_be_bytes());
    body.extend_from_slice(&9u16.to_be_bytes()); // per-afi-safi adj-rib-in
    body.extend_from_slice(&11u16.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.push(1);
    body.extend_from_slice(&42u64.to_be_bytes());
    bmp_frame(1, &body)
}

// ---- recording bus -------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Router {
        action: RouterAction,
        hash: [u8; 16],
        name: Option<String>,
        reason_code: u16,
        reason_text: String,
    },
    RouterTemplated {
        topic: String,
    },
    Peer {
        action: PeerAction,
        hash: [u8; 16],
        addr: String,
        rd: String,
        up_remote_port: Option<u16>,
        down_text: Option<String>,
    },
    Prefix {
        action: PrefixAction,
        prefixes: Vec<(String, u8)>,
        templated: bool,
    },
    Stats {
        type9: Option<StatsData>,
    },
    Raw {
        bytes: Vec<u8>,
    },
}

#[derive(Default)]
struct RecordingBus {
    events: Mutex<Vec<Event>>,
    fail_on_peer: bool,
}

impl RecordingBus {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl MessageBus for RecordingBus {
    fn update_router(&self, router: &RouterRecord, action: RouterAction) -> Result<(), BusError> {
        self.push(Event::Router {
            action,
            hash: router.hash_id,
            name: router.name.clone(),
            reason_code: router.term_reason_code,
            reason_text: router.term_reason_text.clone(),
        });
        Ok(())
    }

    fn update_router_templated(
        &self,
        _fields: &DecodedUpdate,
        _action: RouterAction,
        template: &TemplateEntry,
    ) -> Result<(), BusError> {
        self.push(Event::RouterTemplated {
            topic: template.topic.clone(),
        });
        Ok(())
    }

    fn update_peer(
        &self,
        peer: &PeerRecord,
        up_event: Option<&PeerUpEvent>,
        down_event: Option<&PeerDownEvent>,
        action: PeerAction,
    ) -> Result<(), BusError> {
        if self.fail_on_peer {
            return Err(BusError("bus unavailable".to_string()));
        }
        self.push(Event::Peer {
            action,
            hash: peer.hash_id,
            addr: peer.peer_addr.clone(),
            rd: peer.peer_rd.clone(),
            up_remote_port: up_event.map(|e| e.remote_port),
            down_text: down_event.map(|e| e.error_text.clone()),
        });
        Ok(())
    }

    fn update_unicast_prefix(
        &self,
        _peer: &PeerRecord,
        update: &DecodedUpdate,
        action: PrefixAction,
        template: Option<&TemplateEntry>,
    ) -> Result<(), BusError> {
        let list = match action {
            PrefixAction::Add => &update.announced,
            PrefixAction::Del => &update.withdrawn,
        };
        self.push(Event::Prefix {
            action,
            prefixes: list.iter().map(|p| (p.prefix.clone(), p.len)).collect(),
            templated: template.is_some(),
        });
        Ok(())
    }

    fn add_stat_report(&self, _peer: &PeerRecord, stats: &StatsReport) -> Result<(), BusError> {
        self.push(Event::Stats {
            type9: stats.get(StatType::RoutesInPerAfiSafiAdjRibIn).cloned(),
        });
        Ok(())
    }

    fn send_bmp_raw(
        &self,
        _router_hash: &[u8; 16],
        _peer: Option<&PeerRecord>,
        frame: &Bytes,
    ) -> Result<(), BusError> {
        self.push(Event::Raw {
            bytes: frame.to_vec(),
        });
        Ok(())
    }
}

fn run_stream(stream: Vec<u8>, templates: &TemplateMap) -> (Vec<Event>, Result<(), ReaderError>) {
    let bus = RecordingBus::default();
    let mut reader = BmpReader::new(client(), CollectorConfig::default());
    let stop = AtomicBool::new(false);
    let result = reader.run(&mut Cursor::new(stream), &bus, templates, &stop);
    (bus.events(), result)
}

fn expected_peer_hash(peer_addr: &str, rd: &str) -> [u8; 16] {
    let router_hash = client().hash_id;
    let mut input = peer_addr.as_bytes().to_vec();
    input.extend_from_slice(rd.as_bytes());
    input.extend_from_slice(&router_hash);
    md5::compute(&input).0
}

// ---- scenarios -----------------------------------------------------------

#[test]
fn init_then_term() {
    let mut stream = init_msg("r1");
    let init_bytes = stream.clone();
    let term_bytes = term_msg(0);
    stream.extend_from_slice(&term_bytes);

    let (events, result) = run_stream(stream, &TemplateMap::default());
    assert!(result.is_ok());

    let hash = client().hash_id;
    assert_eq!(
        events,
        vec![
            Event::Router {
                action: RouterAction::Init,
                hash,
                name: Some("r1".to_string()),
                reason_code: 0,
                reason_text: String::new(),
            },
            Event::Raw { bytes: init_bytes },
            Event::Router {
                action: RouterAction::Term,
                hash,
                name: None,
                reason_code: 0,
                reason_text: String::new(),
            },
            Event::Raw { bytes: term_bytes },
        ]
    );
}

#[test]
fn peer_up_then_route() {
    let peer = [10, 0, 0, 1];
    let mut stream = peer_up_msg(peer, 65000);
    stream.extend_from_slice(&route_mon_msg(peer, 65000));

    let (events, result) = run_stream(stream, &TemplateMap::default());
    // stream ends without a protocol TERM: the reader reports the loss
    assert!(matches!(result, Err(ReaderError::Truncated)));

    let router_firsts: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, Event::Router { action: RouterAction::First, .. }))
        .collect();
    assert_eq!(router_firsts.len(), 1, "exactly one router FIRST");

    let peer_hash = expected_peer_hash("10.0.0.1", "0");
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Peer { action: PeerAction::Up, hash, up_remote_port: Some(40000), .. }
        if *hash == peer_hash
    )));

    assert!(events.iter().any(|e| matches!(
        e,
        Event::Prefix { action: PrefixAction::Add, prefixes, .. }
        if prefixes == &vec![("192.0.2.0".to_string(), 24u8)]
    )));

    let raw_count = events
        .iter()
        .filter(|e| matches!(e, Event::Raw { .. }))
        .count();
    assert_eq!(raw_count, 2);

    // trailing synthetic TERM for the dropped connection
    assert!(matches!(
        events.last(),
        Some(Event::Router { action: RouterAction::Term, reason_code, .. })
        if *reason_code == TERM_REASON_OPENBMP_CONN_ERR
    ));
}

#[test]
fn local_close_with_notify() {
    let peer = [10, 0, 0, 1];
    let notification = bgp_pdu(3, &[6, 2]); // Cease / Administrative Shutdown
    let stream = peer_down_msg(peer, 65000, 1, &notification);

    let (events, _) = run_stream(stream, &TemplateMap::default());

    let peer_hash = expected_peer_hash("10.0.0.1", "0");
    let peer_events: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Peer {
                action,
                hash,
                down_text,
                ..
            } => Some((*action, *hash, down_text.clone())),
            _ => None,
        })
        .collect();

    assert_eq!(peer_events.len(), 2);
    assert_eq!(peer_events[0], (PeerAction::First, peer_hash, None));
    assert_eq!(peer_events[1].0, PeerAction::Down);
    let down_text = peer_events[1].2.as_deref().unwrap();
    assert!(
        down_text.starts_with("Local close by ("),
        "unexpected text: {down_text}"
    );
    assert!(down_text.contains("Cease"));
}

#[test]
fn local_close_without_notify() {
    let peer = [10, 0, 0, 1];
    let stream = peer_down_msg(peer, 65000, 2, &[0, 6]);

    let (events, _) = run_stream(stream, &TemplateMap::default());

    let down_text = events
        .iter()
        .find_map(|e| match e {
            Event::Peer {
                action: PeerAction::Down,
                down_text,
                ..
            } => down_text.clone(),
            _ => None,
        })
        .expect("expected a peer DOWN");
    assert!(
        down_text.contains("fsm_event=6, No BGP notify message."),
        "unexpected text: {down_text}"
    );
}

#[test]
fn unassigned_down_reason_keeps_default_text() {
    let peer = [10, 0, 0, 1];
    let stream = peer_down_msg(peer, 65000, 9, &[]);

    let (events, _) = run_stream(stream, &TemplateMap::default());
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Peer { action: PeerAction::Down, down_text: Some(text), .. }
        if text.is_empty()
    )));
}

#[test]
fn truncated_stream_synthesizes_term() {
    let mut stream = init_msg("r1");
    stream.extend_from_slice(&route_mon_msg([10, 0, 0, 1], 65000)[..4]);

    let (events, result) = run_stream(stream, &TemplateMap::default());
    assert!(matches!(result, Err(ReaderError::Truncated)));

    match events.last() {
        Some(Event::Router {
            action: RouterAction::Term,
            reason_code,
            reason_text,
            ..
        }) => {
            assert_eq!(*reason_code, TERM_REASON_OPENBMP_CONN_ERR);
            assert!(
                reason_text.starts_with("Unable to read"),
                "unexpected text: {reason_text}"
            );
        }
        other => panic!("expected a synthetic TERM, got {other:?}"),
    }

    // the init message still went out normally before the failure
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Router { action: RouterAction::Init, .. })));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, Event::Raw { .. }))
            .count(),
        1
    );
}

#[test]
fn stats_report() {
    let peer = [10, 0, 0, 1];
    let stream = stats_msg(peer, 65000);

    let (events, _) = run_stream(stream, &TemplateMap::default());

    let first_index = events
        .iter()
        .position(|e| matches!(e, Event::Peer { action: PeerAction::First, .. }))
        .expect("expected a peer FIRST");
    let stats_index = events
        .iter()
        .position(|e| matches!(e, Event::Stats { .. }))
        .expect("expected a stat report");
    assert!(first_index < stats_index);

    assert!(events.iter().any(|e| matches!(
        e,
        Event::Stats { type9: Some(StatsData::AfiSafiGauge(1, 1, 42)) }
    )));
}

// ---- invariants ----------------------------------------------------------

#[test]
fn raw_fanout_matches_wire_bytes() {
    let peer = [10, 0, 0, 1];
    let mut stream = init_msg("r1");
    stream.extend_from_slice(&peer_up_msg(peer, 65000));
    stream.extend_from_slice(&route_mon_msg(peer, 65000));
    stream.extend_from_slice(&term_msg(0));
    let total = stream.len();

    let (events, result) = run_stream(stream, &TemplateMap::default());
    assert!(result.is_ok());

    let raw_total: usize = events
        .iter()
        .filter_map(|e| match e {
            Event::Raw { bytes } => Some(bytes.len()),
            _ => None,
        })
        .sum();
    assert_eq!(raw_total, total);
}

#[test]
fn identical_streams_emit_identical_records() {
    let peer = [10, 0, 0, 1];
    let mut stream = init_msg("r1");
    stream.extend_from_slice(&peer_up_msg(peer, 65000));
    stream.extend_from_slice(&route_mon_msg(peer, 65000));
    stream.extend_from_slice(&term_msg(0));

    let (first, _) = run_stream(stream.clone(), &TemplateMap::default());
    let (second, _) = run_stream(stream, &TemplateMap::default());
    assert_eq!(first, second);
}

#[test]
fn peer_first_only_once_per_peer() {
    let peer = [10, 0, 0, 1];
    let mut stream = peer_down_msg(peer, 65000, 9, &[]);
    stream.extend_from_slice(&stats_msg(peer, 65000));
    stream.extend_from_slice(&term_msg(0));

    let (events, result) = run_stream(stream, &TemplateMap::default());
    assert!(result.is_ok());

    let firsts = events
        .iter()
        .filter(|e| matches!(e, Event::Peer { action: PeerAction::First, .. }))
        .count();
    assert_eq!(firsts, 1);
}

#[test]
fn templated_router_emission() {
    let mut templates = TemplateMap::default();
    templates.insert(
        TemplateTopic::Router,
        TemplateEntry {
            topic: "parsed.router".to_string(),
            format: "tsv".to_string(),
        },
    );

    let mut stream = init_msg("r1");
    stream.extend_from_slice(&term_msg(0));
    let (events, _) = run_stream(stream, &templates);

    assert!(events.iter().any(|e| matches!(
        e,
        Event::RouterTemplated { topic } if topic == "parsed.router"
    )));
}

#[test]
fn stop_signal_returns_without_term() {
    let bus = RecordingBus::default();
    let mut reader = BmpReader::new(client(), CollectorConfig::default());
    let stop = AtomicBool::new(true);
    let stream = init_msg("r1");
    let result = reader.run(
        &mut Cursor::new(stream),
        &bus,
        &TemplateMap::default(),
        &stop,
    );
    assert!(result.is_ok());
    assert!(bus.events().is_empty());
}

#[test]
fn bus_failure_is_fatal() {
    let bus = RecordingBus {
        fail_on_peer: true,
        ..Default::default()
    };
    let mut reader = BmpReader::new(client(), CollectorConfig::default());
    let stop = AtomicBool::new(false);
    let stream = peer_down_msg([10, 0, 0, 1], 65000, 9, &[]);
    let result = reader.run(
        &mut Cursor::new(stream),
        &bus,
        &TemplateMap::default(),
        &stop,
    );
    assert!(matches!(result, Err(ReaderError::Bus(_))));

    // the failure still produced the synthetic TERM
    assert!(matches!(
        bus.events().last(),
        Some(Event::Router { action: RouterAction::Term, reason_code, .. })
        if *reason_code == TERM_REASON_OPENBMP_CONN_ERR
    ));
}
