//! `external` checks: a command run on the broker.

use std::collections::BTreeMap;

use circonus_api::CheckBundle;
use circonus_api::config::{ARG_PREFIX, COMMAND, ENV_PREFIX, OUTPUT_EXTRACT};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, put, set};
use crate::check::config_reader::ConfigReader;
use crate::error::{Error, Result};
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

/// `external` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalConfig {
    /// Command arguments, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Command to run
    pub command: String,
    /// Environment variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// How to parse the output (`nagios`, `json`, `regex`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_extract: Option<String>,
}

impl CheckTypeConfig for ExternalConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string_list("args").describe("Arguments passed to the command"),
            Attribute::string("command")
                .required()
                .describe("The command to run on the broker"),
            Attribute::string_map("env").describe("Environment variables for the command"),
            Attribute::string("output_extract")
                .validate(Validator::OneOf(&["nagios", "json", "regex"]))
                .describe("How to extract metrics from the command output"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        set(bundle, COMMAND, &self.command);
        for (i, arg) in self.args.iter().enumerate() {
            set(bundle, &format!("{ARG_PREFIX}{i}"), arg);
        }
        for (name, value) in &self.env {
            set(bundle, &format!("{ENV_PREFIX}{name}"), value);
        }
        put(bundle, OUTPUT_EXTRACT, self.output_extract.as_deref());
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        let mut indexed = reader
            .take_prefixed(ARG_PREFIX)
            .into_iter()
            .map(|(index, value)| {
                index
                    .parse::<usize>()
                    .map(|i| (i, value))
                    .map_err(|_| Error::provider_bug(format!("unexpected argument key {index:?}")))
            })
            .collect::<Result<Vec<_>>>()?;
        indexed.sort_by_key(|(i, _)| *i);

        Ok(Self {
            args: indexed.into_iter().map(|(_, v)| v).collect(),
            command: reader.required(COMMAND)?,
            env: reader.take_prefixed(ENV_PREFIX),
            output_extract: reader.take_non_empty(OUTPUT_EXTRACT),
        })
    }
}
