//! Byte-level decoders: a small byte-reading trait plus the BGP and BMP
//! wire parsers built on it.

pub mod bgp;
pub mod bmp;
mod utils;

pub(crate) use utils::*;

pub use bgp::messages::{
    parse_bgp_message, parse_bgp_notification_message, parse_bgp_open_message,
    parse_bgp_update_message,
};
pub use bmp::parse_bmp_msg;
pub use utils::ReadUtils;
