//! BGP NOTIFICATION error codes.
//!
//! IANA assignments:
//! <https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-3>

use std::fmt::{Display, Formatter};

/// A BGP NOTIFICATION error code/subcode pair, kept verbatim from the wire.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct BgpError {
    pub code: u8,
    pub subcode: u8,
}

impl BgpError {
    pub const fn new(code: u8, subcode: u8) -> Self {
        BgpError { code, subcode }
    }

    pub const fn code_name(&self) -> &'static str {
        match self.code {
            0 => "Reserved",
            1 => "Message Header Error",
            2 => "OPEN Message Error",
            3 => "UPDATE Message Error",
            4 => "Hold Timer Expired",
            5 => "Finite State Machine Error",
            6 => "Cease",
            7 => "ROUTE-REFRESH Message Error",
            _ => "Unknown",
        }
    }

    /// Subcode names for the Cease code, the one routers actually send on
    /// administrative session teardown (RFC 4486).
    pub const fn cease_subcode_name(&self) -> Option<&'static str> {
        if self.code != 6 {
            return None;
        }
        Some(match self.subcode {
            1 => "Maximum Number of Prefixes Reached",
            2 => "Administrative Shutdown",
            3 => "Peer De-configured",
            4 => "Administrative Reset",
            5 => "Connection Rejected",
            6 => "Other Configuration Change",
            7 => "Connection Collision Resolution",
            8 => "Out of Resources",
            _ => "Unspecified",
        })
    }
}

impl Display for BgpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.cease_subcode_name() {
            Some(name) => write!(f, "{} ({})", self.code_name(), name),
            None => write!(
                f,
                "{} (code={} subcode={})",
                self.code_name(),
                self.code,
                self.subcode
            ),
        }
    }
}
