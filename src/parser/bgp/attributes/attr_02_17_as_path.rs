use crate::error::ParserError;
use crate::models::*;
use crate::parser::ReadUtils;

const AS_PATH_AS_SET: u8 = 1;
const AS_PATH_AS_SEQUENCE: u8 = 2;
// https://datatracker.ietf.org/doc/html/rfc5065
const AS_PATH_CONFED_SEQUENCE: u8 = 3;
const AS_PATH_CONFED_SET: u8 = 4;

pub fn parse_as_path(mut input: &[u8], asn_len: AsnLength) -> Result<AsPath, ParserError> {
    let mut output = AsPath {
        segments: Vec::with_capacity(5),
    };
    while input.remaining() > 0 {
        let segment = parse_as_path_segment(&mut input, asn_len)?;
        output.append_segment(segment);
    }
    Ok(output)
}

fn parse_as_path_segment(
    input: &mut &[u8],
    asn_len: AsnLength,
) -> Result<AsPathSegment, ParserError> {
    let segment_type = input.read_u8()?;
    let count = input.read_u8()? as usize;
    let path = input.read_asns(asn_len, count)?;
    match segment_type {
        AS_PATH_AS_SET => Ok(AsPathSegment::AsSet(path)),
        AS_PATH_AS_SEQUENCE => Ok(AsPathSegment::AsSequence(path)),
        AS_PATH_CONFED_SEQUENCE => Ok(AsPathSegment::ConfedSequence(path)),
        AS_PATH_CONFED_SET => Ok(AsPathSegment::ConfedSet(path)),
        _ => Err(ParserError::ParseError(format!(
            "Invalid AS path segment type: {segment_type}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_as_path_16bit() {
        let data: &[u8] = &[2, 3, 0xfd, 0xe8, 0xfd, 0xe9, 0xfd, 0xea];
        let path = parse_as_path(data, AsnLength::Bits16).unwrap();
        assert_eq!(path.to_string(), "65000 65001 65002");
    }

    #[test]
    fn test_parse_as_path_32bit() {
        let data: &[u8] = &[2, 1, 0x00, 0x03, 0x0d, 0x41];
        let path = parse_as_path(data, AsnLength::Bits32).unwrap();
        assert_eq!(path.to_string(), "200001");
    }

    #[test]
    fn test_parse_as_set() {
        let data: &[u8] = &[1, 2, 0, 7, 0, 8];
        let path = parse_as_path(data, AsnLength::Bits16).unwrap();
        assert_eq!(path.segments.len(), 1);
        assert_eq!(
            path.segments[0],
            AsPathSegment::AsSet(vec![Asn::new_16bit(7), Asn::new_16bit(8)])
        );
    }

    #[test]
    fn test_invalid_segment_type() {
        let data: &[u8] = &[9, 1, 0, 7];
        assert!(parse_as_path(data, AsnLength::Bits16).is_err());
    }
}
