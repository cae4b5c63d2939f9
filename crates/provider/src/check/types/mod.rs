//! Check-type blocks.
//!
//! A `circonus_check` carries exactly one check-type block (`http`, `tcp`,
//! `icmp_ping`, ...). Each block has a typed config struct implementing
//! [`CheckTypeConfig`]; [`CheckType`] ties them together so dispatch is an
//! exhaustive `match` rather than a lookup table.

use std::collections::BTreeMap;

use circonus_api::CheckBundle;
use circonus_api::config::{CA_CHAIN, CERT_FILE, CIPHERS, HEADER_PREFIX, KEY_FILE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config_reader::ConfigReader;
use crate::block::single;
use crate::error::{Error, Result};
use crate::schema::{Attribute, Block};

pub mod caql;
pub mod cloudwatch;
pub mod consul;
pub mod dns;
pub mod external;
pub mod http;
pub mod httptrap;
pub mod icmp_ping;
pub mod jmx;
pub mod json;
pub mod memcached;
pub mod mysql;
pub mod ntp;
pub mod postgresql;
pub mod promtext;
pub mod redis;
pub mod smtp;
pub mod snmp;
pub mod statsd;
pub mod tcp;

/// Mapping between one check-type block and the API.
pub trait CheckTypeConfig: Sized {
    /// Attributes of the block.
    fn block() -> Block;

    /// Write the block into `bundle` (its `config`, and `target` where the
    /// type derives it).
    ///
    /// # Errors
    ///
    /// Returns a validation error when the block is inconsistent.
    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()>;

    /// Read the block back, consuming the keys it owns from `reader`.
    ///
    /// # Errors
    ///
    /// Returns a provider-bug error when the API data cannot be represented.
    fn from_api(reader: &mut ConfigReader, bundle: &CheckBundle) -> Result<Self>;
}

macro_rules! check_types {
    ($( $block:ident => $variant:ident($config:ty) = $api:literal ),+ $(,)?) => {
        /// A decoded check-type block.
        #[derive(Debug, Clone, PartialEq)]
        pub enum CheckType {
            $(
                #[doc = concat!("`", stringify!($block), "` block (API type `", $api, "`)")]
                $variant($config),
            )+
        }

        impl CheckType {
            /// Name of the config block.
            #[must_use]
            pub const fn block_name(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => stringify!($block), )+
                }
            }

            /// API check type.
            #[must_use]
            pub const fn api_type(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => $api, )+
                }
            }

            fn write(&self, bundle: &mut CheckBundle) -> Result<()> {
                match self {
                    $( Self::$variant(config) => config.to_api(bundle), )+
                }
            }

            fn read(reader: &mut ConfigReader, bundle: &CheckBundle) -> Result<Self> {
                match bundle.check_type.as_str() {
                    $( $api => Ok(Self::$variant(<$config>::from_api(reader, bundle)?)), )+
                    other => Err(Error::UnsupportedCheckType {
                        check_type: other.to_string(),
                    }),
                }
            }

            /// The block as it appears in state: a one-item list.
            ///
            /// # Errors
            ///
            /// Fails if the config cannot be serialized.
            pub fn state_value(&self) -> Result<Value> {
                let item = match self {
                    $( Self::$variant(config) => serde_json::to_value(config)?, )+
                };
                Ok(Value::Array(vec![item]))
            }
        }

        /// Every check-type block as decoded from config; at most one is set.
        #[derive(Debug, Clone, Default, Deserialize)]
        pub struct CheckTypeBlocks {
            $(
                #[serde(default, deserialize_with = "single")]
                $block: Option<$config>,
            )+
        }

        impl CheckTypeBlocks {
            /// The single configured block.
            ///
            /// # Errors
            ///
            /// Returns a validation error unless exactly one block is set.
            pub fn into_check_type(self) -> Result<CheckType> {
                let mut found = Vec::new();
                $(
                    if let Some(config) = self.$block {
                        found.push(CheckType::$variant(config));
                    }
                )+
                match found.len() {
                    1 => found.pop().ok_or_else(|| Error::provider_bug("check type vanished")),
                    0 => Err(Error::validation(format!(
                        "a check must have exactly one check type block, one of: {}",
                        BLOCK_NAMES.join(", ")
                    ))),
                    _ => Err(Error::validation(format!(
                        "a check may have only one check type block, found: {}",
                        found.iter().map(CheckType::block_name).collect::<Vec<_>>().join(", ")
                    ))),
                }
            }
        }

        /// Names of all check-type blocks.
        pub const BLOCK_NAMES: &[&str] = &[$( stringify!($block), )+];

        /// API check types, in block order.
        pub const API_TYPES: &[&str] = &[$( $api, )+];

        /// Schema attributes for every check-type block.
        #[must_use]
        pub fn block_attributes() -> Vec<Attribute> {
            vec![$( Attribute::block(stringify!($block), <$config>::block().max_items(1)), )+]
        }
    };
}

check_types! {
    caql => Caql(caql::CaqlConfig) = "caql",
    cloudwatch => Cloudwatch(cloudwatch::CloudwatchConfig) = "cloudwatch",
    consul => Consul(consul::ConsulConfig) = "consul",
    dns => Dns(dns::DnsConfig) = "dns",
    external => External(external::ExternalConfig) = "external",
    http => Http(http::HttpConfig) = "http",
    httptrap => HttpTrap(httptrap::HttpTrapConfig) = "httptrap",
    icmp_ping => IcmpPing(icmp_ping::IcmpPingConfig) = "ping_icmp",
    jmx => Jmx(jmx::JmxConfig) = "jmx",
    json => Json(json::JsonConfig) = "json",
    memcached => Memcached(memcached::MemcachedConfig) = "memcached",
    mysql => MySql(mysql::MySqlConfig) = "mysql",
    ntp => Ntp(ntp::NtpConfig) = "ntp",
    postgresql => PostgreSql(postgresql::PostgreSqlConfig) = "postgres",
    promtext => PromText(promtext::PromTextConfig) = "promtext",
    redis => Redis(redis::RedisConfig) = "redis",
    smtp => Smtp(smtp::SmtpConfig) = "smtp",
    snmp => Snmp(snmp::SnmpConfig) = "snmp",
    statsd => Statsd(statsd::StatsdConfig) = "statsd",
    tcp => Tcp(tcp::TcpConfig) = "tcp",
}

impl CheckType {
    /// Set `bundle.check_type` and write the block into `bundle`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the block is inconsistent.
    pub fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        bundle.check_type = self.api_type().to_string();
        self.write(bundle)
    }

    /// Decode the block for `bundle.check_type`.
    ///
    /// # Errors
    ///
    /// Fails for unknown check types and for config keys no block claims.
    pub fn from_api(bundle: &CheckBundle) -> Result<Self> {
        let mut reader = ConfigReader::new(&bundle.config);
        let check_type = Self::read(&mut reader, bundle)?;
        reader.finish()?;
        Ok(check_type)
    }
}

/// TLS settings shared by several check types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// CA chain file on the broker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_chain: Option<String>,
    /// Client certificate file on the broker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_file: Option<String>,
    /// OpenSSL cipher list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphers: Option<String>,
    /// Client key file on the broker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
}

impl TlsConfig {
    pub(crate) fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("ca_chain").describe("CA chain file used to verify the server"),
            Attribute::string("certificate_file")
                .describe("Client certificate file presented to the server"),
            Attribute::string("ciphers").describe("OpenSSL cipher list"),
            Attribute::string("key_file").describe("Client key file"),
        ]
    }

    pub(crate) fn to_api(&self, bundle: &mut CheckBundle) {
        put(bundle, CA_CHAIN, self.ca_chain.as_deref());
        put(bundle, CERT_FILE, self.certificate_file.as_deref());
        put(bundle, CIPHERS, self.ciphers.as_deref());
        put(bundle, KEY_FILE, self.key_file.as_deref());
    }

    pub(crate) fn from_api(reader: &mut ConfigReader) -> Self {
        Self {
            ca_chain: reader.take_non_empty(CA_CHAIN),
            certificate_file: reader.take_non_empty(CERT_FILE),
            ciphers: reader.take_non_empty(CIPHERS),
            key_file: reader.take_non_empty(KEY_FILE),
        }
    }
}

/// Insert `value` under `key` when present.
pub(crate) fn put(bundle: &mut CheckBundle, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        bundle.config.insert(key.to_string(), value.to_string());
    }
}

/// Insert a required value.
pub(crate) fn set(bundle: &mut CheckBundle, key: &str, value: impl ToString) {
    bundle.config.insert(key.to_string(), value.to_string());
}

/// Write `header_<name>` keys.
pub(crate) fn put_headers(bundle: &mut CheckBundle, headers: &BTreeMap<String, String>) {
    for (name, value) in headers {
        bundle
            .config
            .insert(format!("{HEADER_PREFIX}{name}"), value.clone());
    }
}

/// Host and explicit (non-default) port of an absolute URL.
pub(crate) fn url_host_port(raw: &str) -> Result<(String, Option<u16>)> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| Error::validation(format!("invalid URL {raw:?}: {e}")))?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::validation(format!("URL {raw:?} has no host")))?;
    Ok((host.to_string(), parsed.port()))
}

/// `value`, or `default` when empty.
pub(crate) fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

/// Attribute for a `headers` map.
pub(crate) fn headers_attribute() -> Attribute {
    Attribute::string_map("headers").describe("Request headers, sent as `header_<name>` config keys")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_names_and_api_types_line_up() {
        assert_eq!(BLOCK_NAMES.len(), 20);
        assert_eq!(API_TYPES.len(), 20);
        let ping = BLOCK_NAMES.iter().position(|b| *b == "icmp_ping").unwrap();
        assert_eq!(API_TYPES[ping], "ping_icmp");
        let pg = BLOCK_NAMES.iter().position(|b| *b == "postgresql").unwrap();
        assert_eq!(API_TYPES[pg], "postgres");
    }

    #[test]
    fn exactly_one_block_is_selected() {
        let none = CheckTypeBlocks::default().into_check_type().unwrap_err();
        assert!(none.to_string().contains("exactly one check type block"));

        let blocks: CheckTypeBlocks = serde_json::from_value(serde_json::json!({
            "tcp": [{"host": "example.com", "port": 443, "tls": false}],
            "dns": [{"query": "example.com", "ctype": "IN", "rtype": "A"}]
        }))
        .unwrap();
        let err = blocks.into_check_type().unwrap_err();
        assert!(err.to_string().contains("only one check type block"));
        assert!(err.to_string().contains("dns"));
        assert!(err.to_string().contains("tcp"));
    }

    #[test]
    fn unknown_api_type_is_rejected() {
        let bundle = CheckBundle {
            check_type: "collectd".into(),
            ..CheckBundle::default()
        };
        assert!(matches!(
            CheckType::from_api(&bundle),
            Err(Error::UnsupportedCheckType { .. })
        ));
    }

    #[test]
    fn url_host_and_port() {
        assert_eq!(
            url_host_port("https://example.com:8443/health").unwrap(),
            ("example.com".to_string(), Some(8443))
        );
        assert_eq!(
            url_host_port("https://example.com/").unwrap(),
            ("example.com".to_string(), None)
        );
        assert!(url_host_port("not a url").is_err());
    }
}
