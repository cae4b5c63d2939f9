//! `redis` checks.

use circonus_api::CheckBundle;
use circonus_api::config::{COMMAND, DB_INDEX, PASSWORD, PORT};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, or_default, put, set};
use crate::check::config_reader::ConfigReader;
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_COMMAND: &str = "INFO";
const DEFAULT_PORT: u16 = 6379;

fn default_command() -> String {
    DEFAULT_COMMAND.to_string()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// `redis` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Command whose output is collected
    #[serde(default = "default_command")]
    pub command: String,
    /// Database to select
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_index: Option<u32>,
    /// AUTH password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Redis port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            db_index: None,
            password: None,
            port: DEFAULT_PORT,
        }
    }
}

impl CheckTypeConfig for RedisConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string("command")
                .default_value(DEFAULT_COMMAND)
                .validate(Validator::Regex(r"^[A-Za-z][A-Za-z ]*$"))
                .describe("The redis command whose output is collected"),
            Attribute::int("db_index")
                .validate(Validator::IntAtLeast(0))
                .describe("The redis database index to select"),
            Attribute::string("password")
                .sensitive()
                .describe("The redis AUTH password"),
            Attribute::int("port")
                .default_value(DEFAULT_PORT)
                .validate(Validator::IntBetween(1, 65_535))
                .describe("The port redis listens on"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        set(bundle, COMMAND, or_default(&self.command, DEFAULT_COMMAND));
        if let Some(db) = self.db_index {
            set(bundle, DB_INDEX, db);
        }
        put(bundle, PASSWORD, self.password.as_deref());
        set(bundle, PORT, self.port);
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        Ok(Self {
            command: reader.take_or(COMMAND, DEFAULT_COMMAND),
            db_index: reader.take_parsed(DB_INDEX)?,
            password: reader.take_non_empty(PASSWORD),
            port: reader.take_parsed(PORT)?.unwrap_or(DEFAULT_PORT),
        })
    }
}
