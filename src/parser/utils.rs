/*!
IO utility functions for reading wire fields of different lengths and
converting them to the corresponding structs.
*/
use ipnet::{IpNet, Ipv4Net, Ipv6Net, PrefixLenError};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::ParserError;
use crate::models::*;

#[cold]
fn eof(name: &'static str, expected: usize, found: usize) -> ParserError {
    ParserError::IoNotEnoughBytes {
        name,
        expected,
        found,
    }
}

/// Byte-slice reader used by every parser in this crate. All multi-byte
/// integers on the wire are big-endian.
pub trait ReadUtils: Sized {
    fn remaining(&self) -> usize;
    fn advance(&mut self, x: usize) -> Result<(), ParserError>;
    fn split_to(&mut self, n: usize) -> Result<Self, ParserError>;
    fn read_u8(&mut self) -> Result<u8, ParserError>;
    fn read_u16(&mut self) -> Result<u16, ParserError>;
    fn read_u32(&mut self) -> Result<u32, ParserError>;
    fn read_u64(&mut self) -> Result<u64, ParserError>;
    fn read_exact(&mut self, buffer: &mut [u8]) -> Result<(), ParserError>;

    /// Check that the buffer has at least n bytes remaining.
    #[inline(always)]
    fn require_n_remaining(&self, n: usize, target: &'static str) -> Result<(), ParserError> {
        if self.remaining() >= n {
            return Ok(());
        }
        Err(eof(target, n, self.remaining()))
    }

    fn read_address(&mut self, afi: &Afi) -> Result<IpAddr, ParserError> {
        match afi {
            Afi::Ipv4 => self.read_ipv4_address().map(IpAddr::V4),
            Afi::Ipv6 => self.read_ipv6_address().map(IpAddr::V6),
        }
    }

    fn read_ipv4_address(&mut self) -> Result<Ipv4Addr, ParserError> {
        self.read_u32().map(Ipv4Addr::from)
    }

    fn read_ipv6_address(&mut self) -> Result<Ipv6Addr, ParserError> {
        let mut buffer = [0; 16];
        self.read_exact(&mut buffer)?;
        Ok(Ipv6Addr::from(buffer))
    }

    #[inline]
    fn read_asn(&mut self, as_length: AsnLength) -> Result<Asn, ParserError> {
        match as_length {
            AsnLength::Bits16 => self.read_u16().map(Asn::new_16bit),
            AsnLength::Bits32 => self.read_u32().map(Asn::new_32bit),
        }
    }

    fn read_asns(&mut self, as_length: AsnLength, count: usize) -> Result<Vec<Asn>, ParserError> {
        let mut path = Vec::with_capacity(count);
        match as_length {
            AsnLength::Bits16 => {
                self.require_n_remaining(count * 2, "16bit ASNs")?;
                for _ in 0..count {
                    path.push(Asn::new_16bit(self.read_u16()?));
                }
            }
            AsnLength::Bits32 => {
                self.require_n_remaining(count * 4, "32bit ASNs")?;
                for _ in 0..count {
                    path.push(Asn::new_32bit(self.read_u32()?));
                }
            }
        }
        Ok(path)
    }

    #[inline(always)]
    fn read_afi(&mut self) -> Result<Afi, ParserError> {
        let value = self.read_u16()?;
        Afi::try_from(value)
            .map_err(|_| ParserError::ParseError(format!("unknown AFI value: {value}")))
    }

    #[inline(always)]
    fn read_safi(&mut self) -> Result<Safi, ParserError> {
        let value = self.read_u8()?;
        Safi::try_from(value)
            .map_err(|_| ParserError::ParseError(format!("unknown SAFI value: {value}")))
    }

    /// Read one announced/withdrawn prefix.
    ///
    /// One length byte in bits, then the minimum number of address bytes.
    /// With `add_path` a 4-byte path identifier precedes the length byte.
    fn read_nlri_prefix(&mut self, afi: &Afi, add_path: bool) -> Result<NetworkPrefix, ParserError> {
        let path_id = if add_path { self.read_u32()? } else { 0 };

        let bit_len = self.read_u8()?;
        let byte_len: usize = (bit_len as usize + 7) / 8;

        let prefix = match afi {
            Afi::Ipv4 => {
                if bit_len > 32 {
                    return Err(ParserError::InvalidPrefixLength(PrefixLenError));
                }
                let mut buff = [0; 4];
                self.read_exact(&mut buff[..byte_len])?;
                match Ipv4Net::new(Ipv4Addr::from(buff), bit_len) {
                    Ok(v) => IpNet::V4(v),
                    Err(_) => unreachable!("bit length has already been checked"),
                }
            }
            Afi::Ipv6 => {
                if bit_len > 128 {
                    return Err(ParserError::InvalidPrefixLength(PrefixLenError));
                }
                let mut buff = [0; 16];
                self.read_exact(&mut buff[..byte_len])?;
                match Ipv6Net::new(Ipv6Addr::from(buff), bit_len) {
                    Ok(v) => IpNet::V6(v),
                    Err(_) => unreachable!("bit length has already been checked"),
                }
            }
        };

        Ok(NetworkPrefix::new(prefix, path_id))
    }

    fn read_n_bytes(&mut self, n_bytes: usize) -> Result<Vec<u8>, ParserError> {
        self.require_n_remaining(n_bytes, "raw bytes")?;
        let mut buffer = vec![0; n_bytes];
        self.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn read_n_bytes_to_string(&mut self, n_bytes: usize) -> Result<String, ParserError> {
        let buffer = self.read_n_bytes(n_bytes)?;
        Ok(buffer.into_iter().map(|x: u8| x as char).collect::<String>())
    }
}

impl ReadUtils for &'_ [u8] {
    #[inline]
    fn remaining(&self) -> usize {
        self.len()
    }

    #[inline]
    fn advance(&mut self, x: usize) -> Result<(), ParserError> {
        if self.len() >= x {
            *self = &self[x..];
            return Ok(());
        }
        Err(eof("advance", x, self.len()))
    }

    #[inline]
    fn split_to(&mut self, n: usize) -> Result<Self, ParserError> {
        if self.len() >= n {
            let (a, b) = self.split_at(n);
            *self = b;
            return Ok(a);
        }
        Err(eof("split_to", n, self.len()))
    }

    #[inline(always)]
    fn read_u8(&mut self) -> Result<u8, ParserError> {
        if !self.is_empty() {
            let value = self[0];
            *self = &self[1..];
            return Ok(value);
        }
        Err(eof("read_u8", 1, 0))
    }

    #[inline(always)]
    fn read_u16(&mut self) -> Result<u16, ParserError> {
        if self.len() >= 2 {
            let (bytes, remaining) = self.split_at(2);
            *self = remaining;
            return Ok(u16::from_be_bytes(bytes.try_into().unwrap()));
        }
        Err(eof("read_u16", 2, self.len()))
    }

    #[inline(always)]
    fn read_u32(&mut self) -> Result<u32, ParserError> {
        if self.len() >= 4 {
            let (bytes, remaining) = self.split_at(4);
            *self = remaining;
            return Ok(u32::from_be_bytes(bytes.try_into().unwrap()));
        }
        Err(eof("read_u32", 4, self.len()))
    }

    #[inline(always)]
    fn read_u64(&mut self) -> Result<u64, ParserError> {
        if self.len() >= 8 {
            let (bytes, remaining) = self.split_at(8);
            *self = remaining;
            return Ok(u64::from_be_bytes(bytes.try_into().unwrap()));
        }
        Err(eof("read_u64", 8, self.len()))
    }

    #[inline]
    fn read_exact(&mut self, buffer: &mut [u8]) -> Result<(), ParserError> {
        let n = buffer.len();
        if self.len() >= n {
            buffer.copy_from_slice(&self[..n]);
            *self = &self[n..];
            return Ok(());
        }
        Err(eof("read_exact", n, self.len()))
    }
}

/// Parse a full NLRI section into a prefix list.
pub fn parse_nlri_list(
    mut input: &[u8],
    add_path: bool,
    afi: &Afi,
) -> Result<Vec<NetworkPrefix>, ParserError> {
    let mut prefixes = Vec::with_capacity(input.len() / 4);
    while !input.is_empty() {
        prefixes.push((&mut input).read_nlri_prefix(afi, add_path)?);
    }
    Ok(prefixes)
}
