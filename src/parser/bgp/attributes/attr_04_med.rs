use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;

pub fn parse_med(mut input: &[u8]) -> Result<AttributeValue, ParserError> {
    Ok(AttributeValue::MultiExitDiscriminator(input.read_u32()?))
}
