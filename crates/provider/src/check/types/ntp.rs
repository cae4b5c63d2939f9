//! `ntp` checks.

use circonus_api::CheckBundle;
use circonus_api::config::{CONTROL, PORT};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, set};
use crate::check::config_reader::{ConfigReader, bool_value};
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_PORT: u16 = 123;

const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// `ntp` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NtpConfig {
    /// NTP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Query the control interface instead of timing a request
    #[serde(default)]
    pub use_control: bool,
}

impl Default for NtpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            use_control: false,
        }
    }
}

impl CheckTypeConfig for NtpConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::int("port")
                .default_value(DEFAULT_PORT)
                .validate(Validator::IntBetween(1, 65_535))
                .describe("The port the NTP server listens on"),
            Attribute::bool("use_control")
                .default_value(false)
                .describe("Use the NTP control channel to gather information about the server"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        set(bundle, PORT, self.port);
        set(bundle, CONTROL, bool_value(self.use_control));
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        Ok(Self {
            port: reader.take_parsed(PORT)?.unwrap_or(DEFAULT_PORT),
            use_control: reader.take_bool(CONTROL)?.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    #[test]
    fn control_flag_round_trips() {
        let config = NtpConfig {
            port: 123,
            use_control: true,
        };
        let mut bundle = CheckBundle::default();
        CheckType::Ntp(config.clone()).to_api(&mut bundle).unwrap();
        assert_eq!(bundle.config[CONTROL], "true");
        assert_eq!(CheckType::from_api(&bundle).unwrap(), CheckType::Ntp(config));
    }
}
