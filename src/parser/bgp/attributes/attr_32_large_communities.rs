use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;

pub fn parse_large_communities(mut input: &[u8]) -> Result<AttributeValue, ParserError> {
    let mut communities = vec![];
    while input.remaining() > 0 {
        let global_administrator = input.read_u32()?;
        let local_data = [input.read_u32()?, input.read_u32()?];
        communities.push(LargeCommunity::new(global_administrator, local_data));
    }
    Ok(AttributeValue::LargeCommunities(communities))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_large_communities() {
        let data: &[u8] = &[
            0, 0, 0xfd, 0xe8, // 65000
            0, 0, 0, 1, //
            0, 0, 0, 2, //
        ];
        match parse_large_communities(data).unwrap() {
            AttributeValue::LargeCommunities(communities) => {
                assert_eq!(communities.len(), 1);
                assert_eq!(communities[0], LargeCommunity::new(65000, [1, 2]));
            }
            _ => panic!("expected large communities"),
        }
    }
}
