/*!
`bmp-collector` implements the per-connection core of a BMP collector.

A router opens a TCP session and continuously pushes framed BMP
([RFC 7854](https://datatracker.ietf.org/doc/html/rfc7854)) messages
describing its own lifecycle, its BGP peers' lifecycle, route monitoring
updates, and periodic statistics. For each connection this crate:

- frames and decodes every inbound BMP message,
- binds router and per-peer contexts across messages and stamps each record
  with a stable content-derived 16-byte identity,
- decodes the embedded BGP payloads carried by PEER_UP / PEER_DOWN /
  ROUTE_MONITORING messages,
- forwards typed records plus the verbatim frame bytes to a
  [`MessageBus`](collector::MessageBus) implementation.

The listening socket and the bus transport live outside this crate: a
supervisor accepts clients and hands each connection to one
[`BmpReader`](collector::BmpReader), which drives it until orderly
termination, malformed input, or transport failure. One malformed message
kills its connection, never the process.

# Example

Reading a BMP byte stream from an already-accepted connection:

```no_run
use std::net::{IpAddr, TcpStream};
use std::sync::atomic::AtomicBool;
use bmp_collector::collector::{BmpReader, ClientInfo, CollectorConfig, LoggingBus, TemplateMap};

let mut stream = TcpStream::connect("192.0.2.1:5000").unwrap();
let router_ip: IpAddr = stream.peer_addr().unwrap().ip();
let client = ClientInfo::new(bmp_collector::collector::router_hash(&router_ip), router_ip);

let mut reader = BmpReader::new(client, CollectorConfig::default());
let stop = AtomicBool::new(false);
reader.run(&mut stream, &LoggingBus, &TemplateMap::default(), &stop).unwrap();
```

The command line daemon `bmp-collectd` (feature `cli`) bundles the accept
loop and a logging bus for quick inspection of a live feed.
*/

pub mod collector;
pub mod error;
pub mod models;
pub mod parser;

pub use crate::error::ParserError;
