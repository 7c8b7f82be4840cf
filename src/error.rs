use std::fmt::{Display, Formatter};
use std::{error::Error, fmt, io};

/// Errors produced by the byte-level decoders in [`crate::parser`].
#[derive(Debug)]
pub enum ParserError {
    IoNotEnoughBytes {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    InvalidPrefixLength(ipnet::PrefixLenError),
    InvalidBgpMessageLength(u16),
    ParseError(String),
    Unsupported(String),
}

impl Error for ParserError {}

impl Display for ParserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::IoNotEnoughBytes {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "not enough bytes reading {name}: expected {expected}, found {found}"
                )
            }
            ParserError::InvalidPrefixLength(e) => write!(f, "{e}"),
            ParserError::InvalidBgpMessageLength(v) => {
                write!(f, "invalid BGP message length {v}")
            }
            ParserError::ParseError(s) => write!(f, "{s}"),
            ParserError::Unsupported(s) => write!(f, "{s}"),
        }
    }
}

impl From<ipnet::PrefixLenError> for ParserError {
    fn from(error: ipnet::PrefixLenError) -> Self {
        ParserError::InvalidPrefixLength(error)
    }
}

/// Errors that end a BMP connection. Framing and dispatch both funnel into
/// this type; the reader reports exactly one synthetic router TERM for any
/// of these before closing the source.
#[derive(Debug)]
pub enum ReaderError {
    /// Transport failure on the input source.
    Io(io::Error),
    /// EOF in the middle of a message (or before one started).
    Truncated,
    /// The framer or a decoder rejected the wire bytes.
    Malformed(String),
    /// The downstream message bus refused an emission.
    Bus(String),
}

impl Error for ReaderError {}

impl Display for ReaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::Io(e) => write!(f, "Unable to read from BMP stream: {e}"),
            ReaderError::Truncated => write!(f, "Unable to read BMP message, disconnected"),
            ReaderError::Malformed(s) => write!(f, "Malformed BMP message: {s}"),
            ReaderError::Bus(s) => write!(f, "Message bus error: {s}"),
        }
    }
}

impl From<io::Error> for ReaderError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => ReaderError::Truncated,
            _ => ReaderError::Io(error),
        }
    }
}

impl From<crate::parser::bmp::ParserBmpError> for ReaderError {
    fn from(error: crate::parser::bmp::ParserBmpError) -> Self {
        ReaderError::Malformed(error.to_string())
    }
}

impl From<ParserError> for ReaderError {
    fn from(error: ParserError) -> Self {
        ReaderError::Malformed(error.to_string())
    }
}
