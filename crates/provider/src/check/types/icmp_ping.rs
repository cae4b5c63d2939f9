//! `icmp_ping` checks (API type `ping_icmp`).

use std::time::Duration;

use circonus_api::CheckBundle;
use circonus_api::config::{AVAIL_NEEDED, COUNT, INTERVAL};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, set};
use crate::check::config_reader::ConfigReader;
use crate::duration;
use crate::error::{Error, Result};
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_AVAILABILITY: f64 = 100.0;
const DEFAULT_COUNT: u32 = 5;
const DEFAULT_INTERVAL: &str = "2s";

const fn default_availability() -> f64 {
    DEFAULT_AVAILABILITY
}

const fn default_count() -> u32 {
    DEFAULT_COUNT
}

fn default_interval() -> String {
    DEFAULT_INTERVAL.to_string()
}

/// `icmp_ping` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcmpPingConfig {
    /// Percentage of packets that must come back for the check to be up
    #[serde(default = "default_availability")]
    pub availability: f64,
    /// Packets sent per run
    #[serde(default = "default_count")]
    pub count: u32,
    /// Time between packets
    #[serde(default = "default_interval")]
    pub interval: String,
}

impl Default for IcmpPingConfig {
    fn default() -> Self {
        Self {
            availability: DEFAULT_AVAILABILITY,
            count: DEFAULT_COUNT,
            interval: default_interval(),
        }
    }
}

impl CheckTypeConfig for IcmpPingConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::float("availability")
                .default_value(DEFAULT_AVAILABILITY)
                .validate(Validator::FloatBetween(0.0, 100.0))
                .describe("The percentage of ICMP available required for the check to be considered valid"),
            Attribute::int("count")
                .default_value(DEFAULT_COUNT)
                .validate(Validator::IntBetween(1, 20))
                .describe("The number of ICMP requests to send during a single check"),
            Attribute::string("interval")
                .default_value(DEFAULT_INTERVAL)
                .validate(Validator::Duration {
                    min: Some("100ms"),
                    max: Some("5m"),
                })
                .describe("Interval between ICMP requests"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        let interval = duration::parse("interval", &self.interval)?;
        set(bundle, AVAIL_NEEDED, self.availability);
        set(bundle, COUNT, self.count);
        set(bundle, INTERVAL, interval.as_millis());
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        let interval = match reader.take_parsed::<u64>(INTERVAL)? {
            Some(millis) => duration::format(Duration::from_millis(millis)),
            None => default_interval(),
        };
        let availability = reader
            .take_parsed::<f64>(AVAIL_NEEDED)?
            .unwrap_or(DEFAULT_AVAILABILITY);
        if !(0.0..=100.0).contains(&availability) {
            return Err(Error::provider_bug(format!(
                "availability {availability} is outside 0..=100"
            )));
        }
        Ok(Self {
            availability,
            count: reader.take_parsed(COUNT)?.unwrap_or(DEFAULT_COUNT),
            interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    #[test]
    fn interval_is_sent_in_milliseconds() {
        let config = IcmpPingConfig {
            availability: 75.0,
            count: 10,
            interval: "500ms".into(),
        };
        let mut bundle = CheckBundle::default();
        CheckType::IcmpPing(config.clone()).to_api(&mut bundle).unwrap();
        assert_eq!(bundle.check_type, "ping_icmp");
        assert_eq!(bundle.config[INTERVAL], "500");
        assert_eq!(bundle.config[AVAIL_NEEDED], "75");
        assert_eq!(bundle.config[COUNT], "10");
        assert_eq!(CheckType::from_api(&bundle).unwrap(), CheckType::IcmpPing(config));
    }

    #[test]
    fn defaults_when_api_omits_keys() {
        let bundle = CheckBundle {
            check_type: "ping_icmp".into(),
            ..CheckBundle::default()
        };
        assert_eq!(
            CheckType::from_api(&bundle).unwrap(),
            CheckType::IcmpPing(IcmpPingConfig::default())
        );
    }

    #[test]
    fn invalid_interval_is_rejected() {
        let config = IcmpPingConfig {
            interval: "often".into(),
            ..IcmpPingConfig::default()
        };
        assert!(config.to_api(&mut CheckBundle::default()).is_err());
    }
}
