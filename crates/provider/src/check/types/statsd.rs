//! `statsd` checks: the broker accepts StatsD packets from one source.

use circonus_api::CheckBundle;
use serde::{Deserialize, Serialize};

use super::CheckTypeConfig;
use crate::check::config_reader::ConfigReader;
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

/// `statsd` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsdConfig {
    /// Address StatsD packets come from; becomes the check target
    pub source_ip: String,
}

impl CheckTypeConfig for StatsdConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string("source_ip")
                .required()
                .validate(Validator::Regex(r".+"))
                .describe("The source IP of the statsd metrics stream"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        bundle.target.clone_from(&self.source_ip);
        Ok(())
    }

    fn from_api(_reader: &mut ConfigReader, bundle: &CheckBundle) -> Result<Self> {
        Ok(Self {
            source_ip: bundle.target.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    #[test]
    fn source_ip_is_the_target() {
        let config = StatsdConfig {
            source_ip: "10.1.2.3".into(),
        };
        let mut bundle = CheckBundle::default();
        CheckType::Statsd(config.clone()).to_api(&mut bundle).unwrap();
        assert_eq!(bundle.target, "10.1.2.3");
        assert!(bundle.config.is_empty());
        assert_eq!(CheckType::from_api(&bundle).unwrap(), CheckType::Statsd(config));
    }
}
