//! `tcp` checks.

use circonus_api::CheckBundle;
use circonus_api::config::{BANNER_MATCH, PORT, USE_SSL};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, TlsConfig, put, set};
use crate::check::config_reader::{ConfigReader, bool_value};
use crate::error::{Error, Result};
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

/// `tcp` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Regex the connection banner must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_regexp: Option<String>,
    /// Host to connect to; becomes the check target
    pub host: String,
    /// Port to connect to
    pub port: u16,
    /// Negotiate TLS after connecting
    #[serde(default)]
    pub tls: bool,
    /// TLS settings
    #[serde(flatten)]
    pub tls_settings: TlsConfig,
}

impl CheckTypeConfig for TcpConfig {
    fn block() -> Block {
        let mut attributes = vec![
            Attribute::string("banner_regexp")
                .describe("This regular expression is matched against the response banner"),
            Attribute::string("host")
                .required()
                .validate(Validator::Regex(r".+"))
                .describe("Hostname or IP address to connect to"),
            Attribute::int("port")
                .required()
                .validate(Validator::IntBetween(1, 65_535))
                .describe("Port number to connect to"),
            Attribute::bool("tls")
                .default_value(false)
                .describe("Upgrade TCP connection to use TLS"),
        ];
        attributes.extend(TlsConfig::attributes());
        Block::new(attributes)
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        bundle.target.clone_from(&self.host);
        put(bundle, BANNER_MATCH, self.banner_regexp.as_deref());
        set(bundle, PORT, self.port);
        set(bundle, USE_SSL, bool_value(self.tls));
        self.tls_settings.to_api(bundle);
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, bundle: &CheckBundle) -> Result<Self> {
        let port = reader
            .take_parsed(PORT)?
            .ok_or_else(|| Error::provider_bug("tcp check is missing its port"))?;
        Ok(Self {
            banner_regexp: reader.take_non_empty(BANNER_MATCH),
            host: bundle.target.clone(),
            port,
            tls: reader.take_bool(USE_SSL)?.unwrap_or(false),
            tls_settings: TlsConfig::from_api(reader),
        })
    }
}
