use crate::parser::bmp::error::ParserBmpError;
use crate::parser::ReadUtils;
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug)]
pub struct InitiationMessage {
    pub tlvs: Vec<InitiationTlv>,
}

#[derive(Debug)]
pub struct InitiationTlv {
    pub info_type: InitiationTlvType,
    pub info_len: u16,
    pub info: String,
}

/// Initiation message TLV types (RFC 7854 Section 4.3).
#[derive(Debug, TryFromPrimitive, IntoPrimitive, PartialEq, Eq, Copy, Clone)]
#[repr(u16)]
pub enum InitiationTlvType {
    String = 0,
    SysDescr = 1,
    SysName = 2,
}

impl InitiationMessage {
    pub fn sys_name(&self) -> Option<&str> {
        self.tlvs
            .iter()
            .find(|tlv| tlv.info_type == InitiationTlvType::SysName)
            .map(|tlv| tlv.info.as_str())
    }

    pub fn sys_descr(&self) -> Option<&str> {
        self.tlvs
            .iter()
            .find(|tlv| tlv.info_type == InitiationTlvType::SysDescr)
            .map(|tlv| tlv.info.as_str())
    }

    pub fn free_form_info(&self) -> impl Iterator<Item = &str> {
        self.tlvs
            .iter()
            .filter(|tlv| tlv.info_type == InitiationTlvType::String)
            .map(|tlv| tlv.info.as_str())
    }
}

pub fn parse_initiation_message(data: &mut &[u8]) -> Result<InitiationMessage, ParserBmpError> {
    let mut tlvs = vec![];

    while data.remaining() >= 4 {
        let info_type = InitiationTlvType::try_from(data.read_u16()?)?;
        let info_len = data.read_u16()?;
        if data.remaining() < info_len as usize {
            return Err(ParserBmpError::TruncatedBmpMessage);
        }
        let info = data.read_n_bytes_to_string(info_len as usize)?;
        tlvs.push(InitiationTlv {
            info_type,
            info_len,
            info,
        });
    }

    Ok(InitiationMessage { tlvs })
}
