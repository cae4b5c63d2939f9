//! `memcached` checks.

use circonus_api::CheckBundle;
use circonus_api::config::PORT;
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, set};
use crate::check::config_reader::ConfigReader;
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_PORT: u16 = 11_211;

const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// `memcached` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemcachedConfig {
    /// memcached port on the target
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl CheckTypeConfig for MemcachedConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::int("port")
                .default_value(DEFAULT_PORT)
                .validate(Validator::IntBetween(1, 65_535))
                .describe("Specifies the port on which the memcached management interface can be reached"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        set(bundle, PORT, self.port);
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        Ok(Self {
            port: reader.take_parsed(PORT)?.unwrap_or(DEFAULT_PORT),
        })
    }
}
