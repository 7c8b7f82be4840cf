use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;

pub fn parse_originator_id(mut input: &[u8]) -> Result<AttributeValue, ParserError> {
    Ok(AttributeValue::OriginatorId(input.read_ipv4_address()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_originator_id() {
        assert_eq!(
            parse_originator_id(&[10, 0, 0, 1]).unwrap(),
            AttributeValue::OriginatorId("10.0.0.1".parse().unwrap())
        );
    }
}
