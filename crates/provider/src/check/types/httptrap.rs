//! `httptrap` checks: metrics pushed to the broker over HTTP.

use circonus_api::CheckBundle;
use circonus_api::config::{ASYNC_METRICS, SECRET};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, put, set};
use crate::check::config_reader::{ConfigReader, bool_value};
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

/// `httptrap` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTrapConfig {
    /// Accept metrics without waiting for the broker to persist them
    #[serde(default)]
    pub async_metrics: bool,
    /// Secret embedded in the submission URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl CheckTypeConfig for HttpTrapConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::bool("async_metrics")
                .default_value(false)
                .describe("Specify whether httptrap metrics are logged immediately or held until the status message is emitted"),
            Attribute::string("secret")
                .sensitive()
                .validate(Validator::Regex(r"^[a-zA-Z0-9_]+$"))
                .describe("Specify the secret with which metrics may be submitted"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        set(bundle, ASYNC_METRICS, bool_value(self.async_metrics));
        put(bundle, SECRET, self.secret.as_deref());
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        Ok(Self {
            async_metrics: reader.take_bool(ASYNC_METRICS)?.unwrap_or(false),
            secret: reader.take_non_empty(SECRET),
        })
    }
}
