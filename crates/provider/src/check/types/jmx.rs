//! `jmx` checks.

use circonus_api::CheckBundle;
use circonus_api::config::{MBEAN_DOMAINS, PASSWORD, PORT, URI, USERNAME};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, or_default, put, set};
use crate::check::config_reader::ConfigReader;
use crate::error::{Error, Result};
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_URI: &str = "/jmxrmi";

/// `jmx` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JmxConfig {
    /// Host running the JMX endpoint; becomes the check target
    pub host: String,
    /// MBean domains to collect
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mbean_domains: Vec<String>,
    /// JMX password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// JMX port
    pub port: u16,
    /// RMI path
    #[serde(default)]
    pub uri: String,
    /// JMX user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl CheckTypeConfig for JmxConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string("host")
                .required()
                .validate(Validator::Regex(r".+"))
                .describe("The host to connect to"),
            Attribute::string_list("mbean_domains")
                .describe("Limit the MBeans actually queried to the listed domains"),
            Attribute::string("password")
                .sensitive()
                .describe("The JMX password"),
            Attribute::int("port")
                .required()
                .validate(Validator::IntBetween(1, 65_535))
                .describe("The port to connect to"),
            Attribute::string("uri")
                .default_value(DEFAULT_URI)
                .describe("The JMX RMI URI path"),
            Attribute::string("username").describe("The JMX username"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        bundle.target.clone_from(&self.host);
        if !self.mbean_domains.is_empty() {
            set(bundle, MBEAN_DOMAINS, self.mbean_domains.join(" "));
        }
        put(bundle, PASSWORD, self.password.as_deref());
        set(bundle, PORT, self.port);
        set(bundle, URI, or_default(&self.uri, DEFAULT_URI));
        put(bundle, USERNAME, self.username.as_deref());
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, bundle: &CheckBundle) -> Result<Self> {
        let port = reader
            .take_parsed(PORT)?
            .ok_or_else(|| Error::provider_bug("jmx check is missing its port"))?;
        Ok(Self {
            host: bundle.target.clone(),
            mbean_domains: reader
                .take(MBEAN_DOMAINS)
                .unwrap_or_default()
                .split_whitespace()
                .map(String::from)
                .collect(),
            password: reader.take_non_empty(PASSWORD),
            port,
            uri: reader.take_or(URI, DEFAULT_URI),
            username: reader.take_non_empty(USERNAME),
        })
    }
}
