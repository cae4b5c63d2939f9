//! `promtext` checks: scrape a Prometheus text exposition endpoint.

use std::collections::BTreeMap;

use circonus_api::CheckBundle;
use circonus_api::config::{HEADER_PREFIX, PORT, URL};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, headers_attribute, put_headers, set, url_host_port};
use crate::check::config_reader::ConfigReader;
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

/// `promtext` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromTextConfig {
    /// Request headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Endpoint to scrape
    pub url: String,
}

impl CheckTypeConfig for PromTextConfig {
    fn block() -> Block {
        Block::new(vec![
            headers_attribute(),
            Attribute::string("url")
                .required()
                .validate(Validator::HttpUrl)
                .describe("The URL of the Prometheus metrics endpoint"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        put_headers(bundle, &self.headers);
        set(bundle, URL, &self.url);
        let (host, port) = url_host_port(&self.url)?;
        if bundle.target.is_empty() {
            bundle.target = host;
        }
        if let Some(port) = port {
            set(bundle, PORT, port);
        }
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        reader.take(PORT);
        Ok(Self {
            headers: reader.take_prefixed(HEADER_PREFIX),
            url: reader.required(URL)?,
        })
    }
}
