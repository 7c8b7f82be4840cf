use num_enum::{FromPrimitive, IntoPrimitive};

/// BGP capability codes.
///
/// <https://www.iana.org/assignments/capability-codes/capability-codes.xhtml>
#[allow(non_camel_case_types)]
#[derive(Debug, FromPrimitive, IntoPrimitive, PartialEq, Eq, Hash, Copy, Clone)]
#[repr(u8)]
pub enum BgpCapabilityType {
    MULTIPROTOCOL_EXTENSIONS_FOR_BGP_4 = 1,
    ROUTE_REFRESH_CAPABILITY_FOR_BGP_4 = 2,
    OUTBOUND_ROUTE_FILTERING_CAPABILITY = 3,
    EXTENDED_NEXT_HOP_ENCODING = 5,
    BGP_EXTENDED_MESSAGE = 6,
    BGPSEC_CAPABILITY = 7,
    MULTIPLE_LABELS_CAPABILITY = 8,
    BGP_ROLE = 9,
    GRACEFUL_RESTART_CAPABILITY = 64,
    SUPPORT_FOR_4_OCTET_AS_NUMBER_CAPABILITY = 65,
    SUPPORT_FOR_DYNAMIC_CAPABILITY = 67,
    MULTISESSION_BGP_CAPABILITY = 68,
    ADD_PATH_CAPABILITY = 69,
    ENHANCED_ROUTE_REFRESH_CAPABILITY = 70,
    LONG_LIVED_GRACEFUL_RESTART_CAPABILITY = 71,
    ROUTING_POLICY_DISTRIBUTION = 72,
    FQDN_CAPABILITY = 73,

    /// Catch-all type for any deprecated, unassigned, or reserved codes
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// ADD-PATH Send/Receive field - RFC 7911, Section 4.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum AddPathDirection {
    Receive = 1,
    Send = 2,
    SendReceive = 3,
}

impl AddPathDirection {
    pub const fn can_receive(&self) -> bool {
        matches!(self, AddPathDirection::Receive | AddPathDirection::SendReceive)
    }

    pub const fn can_send(&self) -> bool {
        matches!(self, AddPathDirection::Send | AddPathDirection::SendReceive)
    }

    pub const fn try_from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AddPathDirection::Receive),
            2 => Some(AddPathDirection::Send),
            3 => Some(AddPathDirection::SendReceive),
            _ => None,
        }
    }
}
