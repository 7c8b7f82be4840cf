use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;

pub fn parse_clusters(mut input: &[u8]) -> Result<AttributeValue, ParserError> {
    let mut clusters = Vec::with_capacity(input.remaining() / 4);
    while input.remaining() > 0 {
        clusters.push(input.read_u32()?);
    }
    Ok(AttributeValue::Clusters(clusters))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clusters() {
        let data: &[u8] = &[0, 0, 0, 1, 0, 0, 0, 2];
        assert_eq!(
            parse_clusters(data).unwrap(),
            AttributeValue::Clusters(vec![1, 2])
        );
    }
}
