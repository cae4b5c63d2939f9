//! `json` checks: fetch a JSON document and turn its leaves into metrics.

use std::collections::BTreeMap;

use circonus_api::CheckBundle;
use circonus_api::config::{
    AUTH_METHOD, AUTH_PASSWORD, AUTH_USER, HEADER_PREFIX, HTTP_VERSION, METHOD, PAYLOAD, PORT,
    READ_LIMIT, URL,
};
use serde::{Deserialize, Serialize};

use super::http::{AUTH_METHODS, SUPPORTED_VERSIONS};
use super::{
    CheckTypeConfig, TlsConfig, headers_attribute, or_default, put, put_headers, set,
    url_host_port,
};
use crate::check::config_reader::ConfigReader;
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_METHOD: &str = "GET";
const DEFAULT_VERSION: &str = "1.1";

/// `json` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonConfig {
    /// Authentication method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,
    /// Authentication password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_password: Option<String>,
    /// Authentication user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_user: Option<String>,
    /// Request headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Request method
    #[serde(default)]
    pub method: String,
    /// Request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Port override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Maximum bytes read from the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_limit: Option<i64>,
    /// TLS settings
    #[serde(flatten)]
    pub tls: TlsConfig,
    /// URL to fetch
    pub url: String,
    /// HTTP version
    #[serde(default)]
    pub version: String,
}

impl CheckTypeConfig for JsonConfig {
    fn block() -> Block {
        let mut attributes = vec![
            Attribute::string("auth_method")
                .validate(Validator::OneOf(AUTH_METHODS))
                .describe("The HTTP Authentication method"),
            Attribute::string("auth_password")
                .sensitive()
                .describe("The HTTP Authentication user password"),
            Attribute::string("auth_user").describe("The HTTP Authentication user name"),
            headers_attribute(),
            Attribute::string("method")
                .default_value(DEFAULT_METHOD)
                .validate(Validator::OneOf(&["GET", "POST", "HEAD", "PUT"]))
                .describe("The HTTP method to use"),
            Attribute::string("payload").describe("The request body sent with the request"),
            Attribute::int("port")
                .validate(Validator::IntBetween(1, 65_535))
                .describe("Specifies the port on which the JSON endpoint will be contacted"),
            Attribute::int("read_limit")
                .validate(Validator::IntAtLeast(0))
                .describe("Sets an approximate limit on the data read (0 means no limit)"),
            Attribute::string("url")
                .required()
                .validate(Validator::HttpUrl)
                .describe("The URL to use as the target of the check"),
            Attribute::string("version")
                .default_value(DEFAULT_VERSION)
                .validate(Validator::OneOf(SUPPORTED_VERSIONS))
                .describe("Sets the HTTP version for the check to use"),
        ];
        attributes.extend(TlsConfig::attributes());
        Block::new(attributes)
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        put(bundle, AUTH_METHOD, self.auth_method.as_deref());
        put(bundle, AUTH_PASSWORD, self.auth_password.as_deref());
        put(bundle, AUTH_USER, self.auth_user.as_deref());
        put_headers(bundle, &self.headers);
        set(bundle, METHOD, or_default(&self.method, DEFAULT_METHOD));
        put(bundle, PAYLOAD, self.payload.as_deref());
        if let Some(port) = self.port {
            set(bundle, PORT, port);
        }
        if let Some(limit) = self.read_limit {
            set(bundle, READ_LIMIT, limit);
        }
        self.tls.to_api(bundle);
        set(bundle, HTTP_VERSION, or_default(&self.version, DEFAULT_VERSION));

        set(bundle, URL, &self.url);
        if bundle.target.is_empty() {
            bundle.target = url_host_port(&self.url)?.0;
        }
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        Ok(Self {
            auth_method: reader.take_non_empty(AUTH_METHOD),
            auth_password: reader.take_non_empty(AUTH_PASSWORD),
            auth_user: reader.take_non_empty(AUTH_USER),
            headers: reader.take_prefixed(HEADER_PREFIX),
            method: reader.take_or(METHOD, DEFAULT_METHOD),
            payload: reader.take_non_empty(PAYLOAD),
            port: reader.take_parsed(PORT)?,
            read_limit: reader.take_parsed(READ_LIMIT)?,
            tls: TlsConfig::from_api(reader),
            url: reader.required(URL)?,
            version: reader.take_or(HTTP_VERSION, DEFAULT_VERSION),
        })
    }
}
