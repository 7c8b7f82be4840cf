//! Minimal BMP collector daemon: accepts router connections, runs one
//! reader per client on its own thread, and renders every bus action
//! through the logger.

use bmp_collector::collector::{
    router_hash, BmpReader, ClientInfo, CollectorConfig, LoggingBus, TemplateMap,
};
use clap::Parser;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Sufficiently large to never mistake a quiet router for a dead one;
/// stats intervals are typically measured in minutes.
const READ_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Parser, Debug)]
#[command(name = "bmp-collectd", about = "BMP collector daemon", version)]
struct Cli {
    /// Address to listen on for BMP connections
    #[arg(short, long, default_value = "0.0.0.0:5000")]
    listen: SocketAddr,

    /// Topic template map (JSON)
    #[arg(short, long)]
    template_file: Option<PathBuf>,

    /// Trace BMP message dispatch
    #[arg(long)]
    debug_bmp: bool,

    /// Trace embedded BGP payload decoding
    #[arg(long)]
    debug_bgp: bool,
}

fn handle_client(
    mut stream: TcpStream,
    config: CollectorConfig,
    templates: TemplateMap,
    stop: Arc<AtomicBool>,
) {
    let peer_addr = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(e) => {
            log::error!("failed to read peer address: {e}");
            return;
        }
    };
    if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
        log::error!("{}: failed to set read timeout: {e}", peer_addr.ip());
        return;
    }

    let router_ip = peer_addr.ip();
    let client = ClientInfo::new(router_hash(&router_ip), router_ip);
    log::info!("{router_ip}: router connected");

    let mut reader = BmpReader::new(client, config);
    match reader.run(&mut stream, &LoggingBus, &templates, &stop) {
        Ok(()) => log::info!("{router_ip}: connection closed"),
        Err(e) => log::info!("{router_ip}: connection failed: {e}"),
    }
    // dropping the stream closes the socket
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = CollectorConfig {
        debug_bmp: cli.debug_bmp,
        debug_bgp: cli.debug_bgp,
    };
    let templates = match &cli.template_file {
        Some(path) => TemplateMap::load(path),
        None => TemplateMap::default(),
    };
    let stop = Arc::new(AtomicBool::new(false));

    let listener = match TcpListener::bind(cli.listen) {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("failed to bind {}: {e}", cli.listen);
            std::process::exit(1);
        }
    };
    log::info!("listening on {}", cli.listen);

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let config = config;
                let templates = templates.clone();
                let stop = Arc::clone(&stop);
                thread::spawn(move || handle_client(stream, config, templates, stop));
            }
            Err(e) => log::error!("accept failed: {e}"),
        }
    }
}
