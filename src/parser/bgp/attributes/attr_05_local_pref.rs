use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;

pub fn parse_local_pref(mut input: &[u8]) -> Result<AttributeValue, ParserError> {
    Ok(AttributeValue::LocalPreference(input.read_u32()?))
}
