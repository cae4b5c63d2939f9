//! `consul` checks: Consul health endpoints.
//!
//! The block names one of a node, a service or a health state; the mapper
//! turns that into the health API URL the broker polls.

use std::collections::BTreeMap;

use circonus_api::CheckBundle;
use circonus_api::config::{
    CHECK_NAME_BLACKLIST, HEADER_PREFIX, NODE_BLACKLIST, SERVICE_BLACKLIST, URL,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::{CheckTypeConfig, TlsConfig, headers_attribute, put_headers, set, url_host_port};
use crate::check::config_reader::ConfigReader;
use crate::error::{Error, Result};
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_HTTP_ADDR: &str = "http://consul.service.consul:8500";
const HEALTH_PATH: &str = "/v1/health/";
const ACL_TOKEN_HEADER: &str = "X-Consul-Token";
const STALE: &str = "stale";

/// Characters left alone in the node/service/state path segment (RFC 3986 unreserved).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `consul` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsulConfig {
    /// ACL token sent as `X-Consul-Token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl_token: Option<String>,
    /// Allow stale reads
    #[serde(default)]
    pub allow_stale: bool,
    /// Check names to ignore
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub check_name_blacklist: Vec<String>,
    /// Datacenter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dc: Option<String>,
    /// Extra request headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Consul agent address
    #[serde(default)]
    pub http_addr: String,
    /// Node to check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// Nodes to ignore
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_blacklist: Vec<String>,
    /// Service to check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Services to ignore
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_blacklist: Vec<String>,
    /// Health state to check (`any`, `passing`, `warning`, `critical`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// TLS settings
    #[serde(flatten)]
    pub tls: TlsConfig,
}

impl ConsulConfig {
    fn health_url(&self) -> Result<String> {
        let (kind, value) = match (&self.node, &self.service, &self.state) {
            (Some(node), None, None) => ("node", node),
            (None, Some(service), None) => ("checks", service),
            (None, None, Some(state)) => ("state", state),
            _ => {
                return Err(Error::validation(
                    "consul check must have exactly one of \"node\", \"service\" or \"state\"",
                ));
            }
        };
        let addr = if self.http_addr.is_empty() {
            DEFAULT_HTTP_ADDR
        } else {
            self.http_addr.as_str()
        };

        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(dc) = &self.dc {
            query.append_pair("dc", dc);
        }
        if self.allow_stale {
            query.append_key_only(STALE);
        }
        let query = query.finish();

        let value = utf8_percent_encode(value, PATH_SEGMENT);
        let mut url = format!("{addr}{HEALTH_PATH}{kind}/{value}");
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl CheckTypeConfig for ConsulConfig {
    fn block() -> Block {
        let mut attributes = vec![
            Attribute::string("acl_token")
                .sensitive()
                .describe("A Consul ACL token"),
            Attribute::bool("allow_stale")
                .default_value(false)
                .describe("Allow Consul to return stale results"),
            Attribute::string_list("check_name_blacklist")
                .describe("Check names to exclude from the results"),
            Attribute::string("dc").describe("The Consul datacenter to query"),
            headers_attribute(),
            Attribute::string("http_addr")
                .default_value(DEFAULT_HTTP_ADDR)
                .validate(Validator::HttpUrl)
                .validate(Validator::Regex(r"[^/]$"))
                .describe("The address of the Consul HTTP API, without a trailing slash"),
            Attribute::string("node").describe("Node to check"),
            Attribute::string_list("node_blacklist").describe("Nodes to exclude from the results"),
            Attribute::string("service").describe("Service to check"),
            Attribute::string_list("service_blacklist")
                .describe("Services to exclude from the results"),
            Attribute::string("state")
                .validate(Validator::OneOf(&["any", "passing", "warning", "critical"]))
                .describe("Health state to check"),
        ];
        attributes.extend(TlsConfig::attributes());
        Block::new(attributes)
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        let url = self.health_url()?;
        if bundle.target.is_empty() {
            bundle.target = url_host_port(&url)?.0;
        }
        set(bundle, URL, url);
        if let Some(token) = &self.acl_token {
            set(bundle, &format!("{HEADER_PREFIX}{ACL_TOKEN_HEADER}"), token);
        }
        put_headers(bundle, &self.headers);
        self.tls.to_api(bundle);
        for (key, list) in [
            (CHECK_NAME_BLACKLIST, &self.check_name_blacklist),
            (NODE_BLACKLIST, &self.node_blacklist),
            (SERVICE_BLACKLIST, &self.service_blacklist),
        ] {
            if !list.is_empty() {
                set(bundle, key, list.join(","));
            }
        }
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        let url = reader.required(URL)?;
        let (base, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
        let (addr, health) = base
            .split_once(HEALTH_PATH)
            .ok_or_else(|| Error::provider_bug(format!("unexpected consul URL {url:?}")))?;
        let (kind, value) = health
            .split_once('/')
            .ok_or_else(|| Error::provider_bug(format!("unexpected consul URL {url:?}")))?;
        let value = percent_decode_str(value)
            .decode_utf8()
            .map_err(|e| Error::provider_bug(format!("unexpected consul URL {url:?}: {e}")))?
            .into_owned();

        let mut config = Self {
            http_addr: addr.to_string(),
            ..Self::default()
        };
        match kind {
            "node" => config.node = Some(value),
            "checks" => config.service = Some(value),
            "state" => config.state = Some(value),
            other => {
                return Err(Error::provider_bug(format!(
                    "unsupported consul health endpoint {other:?}"
                )));
            }
        }
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "dc" => config.dc = Some(value.into_owned()),
                STALE if value.is_empty() => config.allow_stale = true,
                _ => {
                    return Err(Error::provider_bug(format!(
                        "unsupported consul query parameter {key:?}"
                    )));
                }
            }
        }

        let mut headers = reader.take_prefixed(HEADER_PREFIX);
        config.acl_token = headers.remove(ACL_TOKEN_HEADER);
        config.headers = headers;
        config.tls = TlsConfig::from_api(reader);
        config.check_name_blacklist = split_list(reader.take(CHECK_NAME_BLACKLIST));
        config.node_blacklist = split_list(reader.take(NODE_BLACKLIST));
        config.service_blacklist = split_list(reader.take(SERVICE_BLACKLIST));
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    fn sample() -> ConsulConfig {
        ConsulConfig {
            acl_token: Some("token".into()),
            allow_stale: true,
            dc: Some("dc1".into()),
            http_addr: "https://consul.example.com:8501".into(),
            service: Some("web".into()),
            service_blacklist: vec!["legacy".into(), "old".into()],
            headers: BTreeMap::from([("Host".into(), "consul".into())]),
            tls: TlsConfig {
                ca_chain: Some("/etc/ca.pem".into()),
                ..TlsConfig::default()
            },
            ..ConsulConfig::default()
        }
    }

    #[test]
    fn round_trip() {
        let mut bundle = CheckBundle::default();
        CheckType::Consul(sample()).to_api(&mut bundle).unwrap();
        assert_eq!(
            bundle.config[URL],
            "https://consul.example.com:8501/v1/health/checks/web?dc=dc1&stale"
        );
        assert_eq!(bundle.config["header_X-Consul-Token"], "token");
        assert_eq!(bundle.config[SERVICE_BLACKLIST], "legacy,old");
        assert_eq!(bundle.target, "consul.example.com");
        assert_eq!(CheckType::from_api(&bundle).unwrap(), CheckType::Consul(sample()));
    }

    #[test]
    fn address_and_escaped_values_survive_a_round_trip() {
        let config = ConsulConfig {
            dc: Some("east&west".into()),
            http_addr: "http://consul:8500/consul".into(),
            node: Some("rack 4/node?1".into()),
            ..ConsulConfig::default()
        };
        let mut bundle = CheckBundle::default();
        CheckType::Consul(config.clone()).to_api(&mut bundle).unwrap();
        assert_eq!(
            bundle.config[URL],
            "http://consul:8500/consul/v1/health/node/rack%204%2Fnode%3F1?dc=east%26west"
        );
        assert_eq!(CheckType::from_api(&bundle).unwrap(), CheckType::Consul(config));
    }

    #[test]
    fn http_addr_rejects_a_trailing_slash() {
        let block = ConsulConfig::block();
        let attr = block.attribute("http_addr").unwrap();
        let value = serde_json::json!("http://consul:8500/");
        assert!(attr.validators.iter().any(|v| v.check(&value).is_err()));
        let value = serde_json::json!("http://consul:8500");
        assert!(attr.validators.iter().all(|v| v.check(&value).is_ok()));
    }

    #[test]
    fn needs_exactly_one_selector() {
        let mut bundle = CheckBundle::default();
        let none = ConsulConfig::default();
        assert!(none.to_api(&mut bundle).is_err());

        let both = ConsulConfig {
            node: Some("n1".into()),
            state: Some("critical".into()),
            ..ConsulConfig::default()
        };
        assert!(both.to_api(&mut bundle).is_err());
    }
}
