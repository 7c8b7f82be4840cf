//! Data models for the wire protocols this crate decodes.

pub mod bgp;
pub mod network;

pub use bgp::*;
pub use network::*;
