//! `http` checks.

use std::collections::BTreeMap;

use circonus_api::CheckBundle;
use circonus_api::config::{
    AUTH_METHOD, AUTH_PASSWORD, AUTH_USER, BODY, CODE, EXTRACT, HEADER_PREFIX, HTTP_VERSION,
    METHOD, PAYLOAD, PORT, READ_LIMIT, REDIRECTS, URL,
};
use serde::{Deserialize, Serialize};

use super::{
    CheckTypeConfig, TlsConfig, headers_attribute, or_default, put, put_headers, set,
    url_host_port,
};
use crate::check::config_reader::ConfigReader;
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_CODE: &str = "^200$";
const DEFAULT_METHOD: &str = "GET";
const DEFAULT_VERSION: &str = "1.1";
const DEFAULT_REDIRECTS: &str = "0";

/// HTTP versions the broker supports.
pub const SUPPORTED_VERSIONS: &[&str] = &["0.9", "1.0", "1.1", "2.0"];
/// Authentication methods the broker supports.
pub const AUTH_METHODS: &[&str] = &["Basic", "Digest", "Auto"];

/// `http` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Authentication method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,
    /// Authentication password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_password: Option<String>,
    /// Authentication user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_user: Option<String>,
    /// Regex the body must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_regexp: Option<String>,
    /// Regex the status code must match
    #[serde(default)]
    pub code: String,
    /// Regex extracting metrics from the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<String>,
    /// Request headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Request method
    #[serde(default)]
    pub method: String,
    /// Request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Maximum bytes read from the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_limit: Option<i64>,
    /// Redirects to follow
    #[serde(default)]
    pub redirects: String,
    /// TLS settings
    #[serde(flatten)]
    pub tls: TlsConfig,
    /// URL to fetch
    pub url: String,
    /// HTTP version
    #[serde(default)]
    pub version: String,
}

impl CheckTypeConfig for HttpConfig {
    fn block() -> Block {
        let mut attributes = vec![
            Attribute::string("auth_method")
                .validate(Validator::OneOf(AUTH_METHODS))
                .describe("The HTTP Authentication method"),
            Attribute::string("auth_password")
                .sensitive()
                .describe("The HTTP Authentication user password"),
            Attribute::string("auth_user").describe("The HTTP Authentication user name"),
            Attribute::string("body_regexp")
                .describe("This regular expression is matched against the body of the response"),
            Attribute::string("code")
                .default_value(DEFAULT_CODE)
                .describe("The HTTP code that is expected"),
            Attribute::string("extract")
                .describe("This regular expression is matched against the body of the response globally"),
            headers_attribute(),
            Attribute::string("method")
                .default_value(DEFAULT_METHOD)
                .validate(Validator::Regex(r"\S+"))
                .describe("The HTTP method to use"),
            Attribute::string("payload").describe("The information transferred as the payload of an HTTP request"),
            Attribute::int("read_limit")
                .validate(Validator::IntAtLeast(0))
                .describe("Sets an approximate limit on the data read (0 means no limit)"),
            Attribute::string("redirects")
                .default_value(DEFAULT_REDIRECTS)
                .validate(Validator::Regex(r"^\d+$"))
                .describe("The maximum number of HTTP Location header redirects to follow"),
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
        put(bundle, BODY, self.body_regexp.as_deref());
        set(bundle, CODE, or_default(&self.code, DEFAULT_CODE));
        put(bundle, EXTRACT, self.extract.as_deref());
        put_headers(bundle, &self.headers);
        set(bundle, METHOD, or_default(&self.method, DEFAULT_METHOD));
        put(bundle, PAYLOAD, self.payload.as_deref());
        if let Some(limit) = self.read_limit {
            set(bundle, READ_LIMIT, limit);
        }
        set(bundle, REDIRECTS, or_default(&self.redirects, DEFAULT_REDIRECTS));
        self.tls.to_api(bundle);
        set(bundle, HTTP_VERSION, or_default(&self.version, DEFAULT_VERSION));

        set(bundle, URL, &self.url);
        let (host, port) = url_host_port(&self.url)?;
        if bundle.target.is_empty() {
            bundle.target = host;
        }
        if let Some(port) = port {
            bundle.config.entry(PORT.to_string()).or_insert_with(|| port.to_string());
        }
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        // Derived from the URL on write.
        reader.take(PORT);
        Ok(Self {
            auth_method: reader.take_non_empty(AUTH_METHOD),
            auth_password: reader.take_non_empty(AUTH_PASSWORD),
            auth_user: reader.take_non_empty(AUTH_USER),
            body_regexp: reader.take_non_empty(BODY),
            code: reader.take_or(CODE, DEFAULT_CODE),
            extract: reader.take_non_empty(EXTRACT),
            headers: reader.take_prefixed(HEADER_PREFIX),
            method: reader.take_or(METHOD, DEFAULT_METHOD),
            payload: reader.take_non_empty(PAYLOAD),
            read_limit: reader.take_parsed(READ_LIMIT)?,
            redirects: reader.take_or(REDIRECTS, DEFAULT_REDIRECTS),
            tls: TlsConfig::from_api(reader),
            url: reader.required(URL)?,
            version: reader.take_or(HTTP_VERSION, DEFAULT_VERSION),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    fn sample() -> HttpConfig {
        HttpConfig {
            auth_method: Some("Basic".into()),
            auth_password: Some("hunter2".into()),
            auth_user: Some("monitor".into()),
            body_regexp: Some("^ok$".into()),
            code: "^200$".into(),
            extract: None,
            headers: BTreeMap::from([("Host".into(), "example.com".into())]),
            method: "GET".into(),
            payload: None,
            read_limit: Some(1024),
            redirects: "3".into(),
            tls: TlsConfig {
                ca_chain: Some("/etc/ca.pem".into()),
                ciphers: Some("HIGH".into()),
                ..TlsConfig::default()
            },
            url: "https://example.com:8443/health".into(),
            version: "1.1".into(),
        }
    }

    #[test]
    fn round_trip() {
        let mut bundle = CheckBundle::default();
        CheckType::Http(sample()).to_api(&mut bundle).unwrap();
        assert_eq!(bundle.target, "example.com");
        assert_eq!(bundle.config[PORT], "8443");
        assert_eq!(bundle.config[BODY], "^ok$");
        assert_eq!(bundle.config["header_Host"], "example.com");
        assert_eq!(bundle.config[READ_LIMIT], "1024");
        assert_eq!(CheckType::from_api(&bundle).unwrap(), CheckType::Http(sample()));
    }

    #[test]
    fn explicit_target_is_kept() {
        let mut bundle = CheckBundle {
            target: "10.0.0.1".into(),
            ..CheckBundle::default()
        };
        sample().to_api(&mut bundle).unwrap();
        assert_eq!(bundle.target, "10.0.0.1");
    }

    #[test]
    fn server_managed_keys_are_tolerated_on_read() {
        let mut bundle = CheckBundle::default();
        CheckType::Http(sample()).to_api(&mut bundle).unwrap();
        bundle
            .config
            .insert("reverse:secret_key".into(), "s3cr3t".into());
        bundle
            .config
            .insert("submission_url".into(), "https://trap.example.com".into());
        assert!(CheckType::from_api(&bundle).is_ok());

        bundle.config.insert("mystery".into(), "1".into());
        let err = CheckType::from_api(&bundle).unwrap_err();
        assert!(err.to_string().contains("API Config not empty"));
    }
}
