use crate::error::ParserError;
use crate::parser::bmp::headers::{BmpMsgType, BmpPeerType};
use crate::parser::bmp::initiation::InitiationTlvType;
use crate::parser::bmp::termination::TerminationTlvType;
use num_enum::TryFromPrimitiveError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ParserBmpError {
    UnsupportedBmpVersion(u8),
    CorruptedBmpMessage,
    TruncatedBmpMessage,
}

impl Display for ParserBmpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserBmpError::UnsupportedBmpVersion(v) => {
                write!(f, "Unsupported BMP version: {v}")
            }
            ParserBmpError::CorruptedBmpMessage => write!(f, "Corrupted BMP message"),
            ParserBmpError::TruncatedBmpMessage => write!(f, "Truncated BMP message"),
        }
    }
}

impl Error for ParserBmpError {}

impl From<ParserError> for ParserBmpError {
    fn from(_: ParserError) -> Self {
        ParserBmpError::CorruptedBmpMessage
    }
}

impl From<TryFromPrimitiveError<BmpMsgType>> for ParserBmpError {
    fn from(_: TryFromPrimitiveError<BmpMsgType>) -> Self {
        ParserBmpError::CorruptedBmpMessage
    }
}

impl From<TryFromPrimitiveError<BmpPeerType>> for ParserBmpError {
    fn from(_: TryFromPrimitiveError<BmpPeerType>) -> Self {
        ParserBmpError::CorruptedBmpMessage
    }
}

impl From<TryFromPrimitiveError<InitiationTlvType>> for ParserBmpError {
    fn from(_: TryFromPrimitiveError<InitiationTlvType>) -> Self {
        ParserBmpError::CorruptedBmpMessage
    }
}

impl From<TryFromPrimitiveError<TerminationTlvType>> for ParserBmpError {
    fn from(_: TryFromPrimitiveError<TerminationTlvType>) -> Self {
        ParserBmpError::CorruptedBmpMessage
    }
}
