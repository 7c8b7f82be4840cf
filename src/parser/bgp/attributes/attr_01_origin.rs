use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;

pub fn parse_origin(mut input: &[u8]) -> Result<AttributeValue, ParserError> {
    Ok(AttributeValue::Origin(Origin::from(input.read_u8()?)))
}
