//! `smtp` checks.

use circonus_api::CheckBundle;
use circonus_api::config::{
    EHLO, FROM, PAYLOAD, PORT, PROXY_DEST_ADDRESS, PROXY_DEST_PORT, PROXY_FAMILY,
    PROXY_PROTOCOL, PROXY_SOURCE_ADDRESS, PROXY_SOURCE_PORT, SASL_AUTH_ID, SASL_AUTHENTICATION,
    SASL_PASSWORD, SASL_USER, STARTTLS, TO,
};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, or_default, put, set};
use crate::check::config_reader::{ConfigReader, bool_value};
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_EHLO: &str = "noit.local";
const DEFAULT_PORT: u16 = 25;

fn default_ehlo() -> String {
    DEFAULT_EHLO.to_string()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// `smtp` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// EHLO name
    #[serde(default = "default_ehlo")]
    pub ehlo: String,
    /// Envelope sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Message body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// SMTP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// PROXY protocol destination address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_dest_address: Option<String>,
    /// PROXY protocol destination port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_dest_port: Option<u16>,
    /// PROXY protocol address family
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_family: Option<String>,
    /// PROXY protocol transport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_protocol: Option<String>,
    /// PROXY protocol source address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_source_address: Option<String>,
    /// PROXY protocol source port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_source_port: Option<u16>,
    /// SASL authorization identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasl_auth_id: Option<String>,
    /// SASL mechanism
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasl_authentication: Option<String>,
    /// SASL password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasl_password: Option<String>,
    /// SASL user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasl_user: Option<String>,
    /// Issue STARTTLS
    #[serde(default)]
    pub starttls: bool,
    /// Envelope recipient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            ehlo: default_ehlo(),
            from: None,
            payload: None,
            port: DEFAULT_PORT,
            proxy_dest_address: None,
            proxy_dest_port: None,
            proxy_family: None,
            proxy_protocol: None,
            proxy_source_address: None,
            proxy_source_port: None,
            sasl_auth_id: None,
            sasl_authentication: None,
            sasl_password: None,
            sasl_user: None,
            starttls: false,
            to: None,
        }
    }
}

fn port_attribute(name: &'static str, description: &'static str) -> Attribute {
    Attribute::int(name)
        .validate(Validator::IntBetween(1, 65_535))
        .describe(description)
}

impl CheckTypeConfig for SmtpConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string("ehlo")
                .default_value(DEFAULT_EHLO)
                .describe("The name sent with EHLO"),
            Attribute::string("from").describe("The envelope sender"),
            Attribute::string("payload").describe("The message body to send"),
            port_attribute("port", "The SMTP port").default_value(DEFAULT_PORT),
            Attribute::string("proxy_dest_address")
                .describe("The destination address sent in the PROXY protocol header"),
            port_attribute(
                "proxy_dest_port",
                "The destination port sent in the PROXY protocol header",
            ),
            Attribute::string("proxy_family")
                .validate(Validator::OneOf(&["TCP4", "TCP6"]))
                .describe("The address family sent in the PROXY protocol header"),
            Attribute::string("proxy_protocol")
                .describe("The protocol sent in the PROXY protocol header"),
            Attribute::string("proxy_source_address")
                .describe("The source address sent in the PROXY protocol header"),
            port_attribute(
                "proxy_source_port",
                "The source port sent in the PROXY protocol header",
            ),
            Attribute::string("sasl_auth_id").describe("The SASL authorization identity"),
            Attribute::string("sasl_authentication")
                .validate(Validator::OneOf(&["PLAIN", "LOGIN"]))
                .describe("The SASL mechanism"),
            Attribute::string("sasl_password")
                .sensitive()
                .describe("The SASL password"),
            Attribute::string("sasl_user").describe("The SASL user"),
            Attribute::bool("starttls")
                .default_value(false)
                .describe("Issue STARTTLS before sending the message"),
            Attribute::string("to").describe("The envelope recipient"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        set(bundle, EHLO, or_default(&self.ehlo, DEFAULT_EHLO));
        put(bundle, FROM, self.from.as_deref());
        put(bundle, PAYLOAD, self.payload.as_deref());
        set(bundle, PORT, self.port);
        put(bundle, PROXY_DEST_ADDRESS, self.proxy_dest_address.as_deref());
        if let Some(port) = self.proxy_dest_port {
            set(bundle, PROXY_DEST_PORT, port);
        }
        put(bundle, PROXY_FAMILY, self.proxy_family.as_deref());
        put(bundle, PROXY_PROTOCOL, self.proxy_protocol.as_deref());
        put(bundle, PROXY_SOURCE_ADDRESS, self.proxy_source_address.as_deref());
        if let Some(port) = self.proxy_source_port {
            set(bundle, PROXY_SOURCE_PORT, port);
        }
        put(bundle, SASL_AUTH_ID, self.sasl_auth_id.as_deref());
        put(bundle, SASL_AUTHENTICATION, self.sasl_authentication.as_deref());
        put(bundle, SASL_PASSWORD, self.sasl_password.as_deref());
        put(bundle, SASL_USER, self.sasl_user.as_deref());
        set(bundle, STARTTLS, bool_value(self.starttls));
        put(bundle, TO, self.to.as_deref());
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        Ok(Self {
            ehlo: reader.take_or(EHLO, DEFAULT_EHLO),
            from: reader.take_non_empty(FROM),
            payload: reader.take_non_empty(PAYLOAD),
            port: reader.take_parsed(PORT)?.unwrap_or(DEFAULT_PORT),
            proxy_dest_address: reader.take_non_empty(PROXY_DEST_ADDRESS),
            proxy_dest_port: reader.take_parsed(PROXY_DEST_PORT)?,
            proxy_family: reader.take_non_empty(PROXY_FAMILY),
            proxy_protocol: reader.take_non_empty(PROXY_PROTOCOL),
            proxy_source_address: reader.take_non_empty(PROXY_SOURCE_ADDRESS),
            proxy_source_port: reader.take_parsed(PROXY_SOURCE_PORT)?,
            sasl_auth_id: reader.take_non_empty(SASL_AUTH_ID),
            sasl_authentication: reader.take_non_empty(SASL_AUTHENTICATION),
            sasl_password: reader.take_non_empty(SASL_PASSWORD),
            sasl_user: reader.take_non_empty(SASL_USER),
            starttls: reader.take_bool(STARTTLS)?.unwrap_or(false),
            to: reader.take_non_empty(TO),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    #[test]
    fn round_trip_with_proxy_and_sasl() {
        let config = SmtpConfig {
            from: Some("monitor@example.com".into()),
            to: Some("postmaster@example.com".into()),
            proxy_family: Some("TCP4".into()),
            proxy_source_port: Some(40_000),
            sasl_authentication: Some("PLAIN".into()),
            sasl_user: Some("monitor".into()),
            sasl_password: Some("pw".into()),
            starttls: true,
            ..SmtpConfig::default()
        };
        let mut bundle = CheckBundle::default();
        CheckType::Smtp(config.clone()).to_api(&mut bundle).unwrap();
        assert_eq!(bundle.config[EHLO], "noit.local");
        assert_eq!(bundle.config[PORT], "25");
        assert_eq!(bundle.config[STARTTLS], "true");
        assert_eq!(CheckType::from_api(&bundle).unwrap(), CheckType::Smtp(config));
    }
}
