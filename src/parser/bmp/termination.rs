use crate::parser::bmp::error::ParserBmpError;
use crate::parser::ReadUtils;
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, PartialEq, Clone)]
pub struct TerminationMessage {
    pub tlvs: Vec<TerminationTlv>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TerminationTlv {
    pub info_type: TerminationTlvType,
    pub info_len: u16,
    pub info_value: TerminationTlvValue,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TerminationTlvValue {
    String(String),
    Reason(u16),
}

/// Termination message TLV types (RFC 7854 Section 4.5).
#[derive(Debug, TryFromPrimitive, IntoPrimitive, PartialEq, Eq, Copy, Clone)]
#[repr(u16)]
pub enum TerminationTlvType {
    String = 0,
    Reason = 1,
}

impl TerminationMessage {
    /// The numeric reason carried by the Reason TLV, if any.
    pub fn reason_code(&self) -> Option<u16> {
        self.tlvs.iter().find_map(|tlv| match tlv.info_value {
            TerminationTlvValue::Reason(code) => Some(code),
            _ => None,
        })
    }

    /// The free-form string TLV, if any.
    pub fn reason_text(&self) -> Option<&str> {
        self.tlvs.iter().find_map(|tlv| match &tlv.info_value {
            TerminationTlvValue::String(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

pub fn parse_termination_message(data: &mut &[u8]) -> Result<TerminationMessage, ParserBmpError> {
    let mut tlvs = vec![];

    while data.remaining() >= 4 {
        let info_type = TerminationTlvType::try_from(data.read_u16()?)?;
        let info_len = data.read_u16()?;
        if data.remaining() < info_len as usize {
            return Err(ParserBmpError::TruncatedBmpMessage);
        }
        let info_value = match info_type {
            TerminationTlvType::String => {
                TerminationTlvValue::String(data.read_n_bytes_to_string(info_len as usize)?)
            }
            TerminationTlvType::Reason => TerminationTlvValue::Reason(data.read_u16()?),
        };
        tlvs.push(TerminationTlv {
            info_type,
            info_len,
            info_value,
        });
    }

    Ok(TerminationMessage { tlvs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_termination_message() {
        let data: &[u8] = &[
            0, 0, // info_type: String
            0, 5, // info_len: 5
            b'b', b'y', b'e', b'y', b'e', //
            0, 1, // info_type: Reason
            0, 2, // info_len: 2
            0, 1, // reason 1
        ];
        let msg = parse_termination_message(&mut &data[..]).unwrap();
        assert_eq!(msg.tlvs.len(), 2);
        assert_eq!(msg.reason_text(), Some("byeye"));
        assert_eq!(msg.reason_code(), Some(1));
    }

    #[test]
    fn test_empty_termination() {
        let msg = parse_termination_message(&mut &[][..]).unwrap();
        assert!(msg.tlvs.is_empty());
        assert_eq!(msg.reason_code(), None);
    }
}
