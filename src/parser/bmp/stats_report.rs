use crate::parser::bmp::error::ParserBmpError;
use crate::parser::ReadUtils;
use num_enum::{FromPrimitive, IntoPrimitive};

#[derive(Debug, PartialEq, Clone)]
pub struct StatsReport {
    pub stats_count: u32,
    pub counters: Vec<StatCounter>,
}

impl StatsReport {
    pub fn get(&self, ty: StatType) -> Option<&StatsData> {
        self.counters
            .iter()
            .find(|c| c.stat_type == ty)
            .map(|c| &c.stat_data)
    }
}

/// Statistics count values
#[derive(Debug, PartialEq, Clone)]
pub struct StatCounter {
    pub stat_type: StatType,
    pub stat_len: u16,
    pub stat_data: StatsData,
}

#[derive(Debug, PartialEq, Clone)]
pub enum StatsData {
    Counter(u32),
    Gauge(u64),
    AfiSafiGauge(u16, u8, u64),
    Unknown(Vec<u8>),
}

/// Stats counter types enum
///
/// Types of BMP statistics are listed here:
/// <https://www.iana.org/assignments/bmp-parameters/bmp-parameters.xhtml#statistics-types>
#[derive(Debug, FromPrimitive, IntoPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum StatType {
    PrefixesRejectedByInboundPolicy = 0,
    DuplicatePrefixAdvertisements = 1,
    DuplicateWithdrawnPrefixes = 2,
    UpdatesInvalidatedDueToClusterListLoop = 3,
    UpdatesInvalidatedDueToAsPathLoop = 4,
    UpdatesInvalidatedDueToOriginatorId = 5,
    UpdatesInvalidatedDueToAsConfedLoop = 6,
    RoutesInAdjRibsIn = 7,
    RoutesInLocRib = 8,
    RoutesInPerAfiSafiAdjRibIn = 9,
    RoutesInPerAfiSafiLocRib = 10,
    #[num_enum(catch_all)]
    Other(u16) = 65535,
}

pub fn parse_stats_report(data: &mut &[u8]) -> Result<StatsReport, ParserBmpError> {
    let stats_count = data.read_u32()?;
    let mut counters = vec![];
    for _ in 0..stats_count {
        let stat_type = StatType::from(data.read_u16()?);
        let stat_len = data.read_u16()?;
        data.require_n_remaining(stat_len as usize, "stat counter")?;
        let stat_data = match stat_len {
            4 => StatsData::Counter(data.read_u32()?),
            8 => StatsData::Gauge(data.read_u64()?),
            11 => {
                let afi = data.read_u16()?;
                let safi = data.read_u8()?;
                let value = data.read_u64()?;
                StatsData::AfiSafiGauge(afi, safi, value)
            }
            _ => StatsData::Unknown(data.read_n_bytes(stat_len as usize)?),
        };
        counters.push(StatCounter {
            stat_type,
            stat_len,
            stat_data,
        });
    }

    Ok(StatsReport {
        stats_count,
        counters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stats_report_counter() {
        let mut data = vec![];
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&4u16.to_be_bytes());
        data.extend_from_slice(&1234u32.to_be_bytes());

        let report = parse_stats_report(&mut data.as_slice()).unwrap();
        assert_eq!(report.stats_count, 1);
        assert_eq!(
            report.counters[0].stat_type,
            StatType::PrefixesRejectedByInboundPolicy
        );
        assert_eq!(report.counters[0].stat_data, StatsData::Counter(1234));
    }

    #[test]
    fn test_parse_stats_report_gauge() {
        let mut data = vec![];
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&7u16.to_be_bytes());
        data.extend_from_slice(&8u16.to_be_bytes());
        data.extend_from_slice(&99u64.to_be_bytes());

        let report = parse_stats_report(&mut data.as_slice()).unwrap();
        assert_eq!(report.counters[0].stat_type, StatType::RoutesInAdjRibsIn);
        assert_eq!(report.counters[0].stat_data, StatsData::Gauge(99));
    }

    #[test]
    fn test_parse_stats_report_afi_safi_gauge() {
        let mut data = vec![];
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&9u16.to_be_bytes());
        data.extend_from_slice(&11u16.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.push(1);
        data.extend_from_slice(&42u64.to_be_bytes());

        let report = parse_stats_report(&mut data.as_slice()).unwrap();
        assert_eq!(
            report.counters[0].stat_type,
            StatType::RoutesInPerAfiSafiAdjRibIn
        );
        assert_eq!(
            report.counters[0].stat_data,
            StatsData::AfiSafiGauge(1, 1, 42)
        );
    }

    #[test]
    fn test_parse_stats_report_unknown() {
        let mut data = vec![];
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&100u16.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.push(3);

        let report = parse_stats_report(&mut data.as_slice()).unwrap();
        assert_eq!(report.counters[0].stat_type, StatType::Other(100));
        assert_eq!(report.counters[0].stat_data, StatsData::Unknown(vec![3]));
    }

    #[test]
    fn test_truncated_counter_rejected() {
        let mut data = vec![];
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&6u16.to_be_bytes());
        data.extend_from_slice(&1234u32.to_be_bytes());
        assert!(parse_stats_report(&mut data.as_slice()).is_err());
    }
}
