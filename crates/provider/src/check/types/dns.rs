//! `dns` checks.

use circonus_api::CheckBundle;
use circonus_api::config::{CTYPE, NAMESERVER, QUERY, RTYPE};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, or_default, put, set};
use crate::check::config_reader::ConfigReader;
use crate::error::Result;
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_CTYPE: &str = "IN";
const DEFAULT_RTYPE: &str = "A";

/// `dns` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsConfig {
    /// DNS class
    #[serde(default)]
    pub ctype: String,
    /// Server to query; the broker's resolver when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameserver: Option<String>,
    /// Name to look up
    pub query: String,
    /// Record type
    #[serde(default)]
    pub rtype: String,
}

impl CheckTypeConfig for DnsConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string("ctype")
                .default_value(DEFAULT_CTYPE)
                .validate(Validator::OneOf(&["IN", "CH", "HS"]))
                .describe("The DNS class of the query"),
            Attribute::string("nameserver").describe("The nameserver to query"),
            Attribute::string("query")
                .required()
                .describe("The name to query"),
            Attribute::string("rtype")
                .default_value(DEFAULT_RTYPE)
                .validate(Validator::OneOf(&[
                    "A", "AAAA", "CNAME", "MX", "NS", "PTR", "SOA", "SRV", "TXT",
                ]))
                .describe("The DNS resource record type of the query"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        set(bundle, CTYPE, or_default(&self.ctype, DEFAULT_CTYPE));
        put(bundle, NAMESERVER, self.nameserver.as_deref());
        set(bundle, QUERY, &self.query);
        set(bundle, RTYPE, or_default(&self.rtype, DEFAULT_RTYPE));
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        Ok(Self {
            ctype: reader.take_or(CTYPE, DEFAULT_CTYPE),
            nameserver: reader.take_non_empty(NAMESERVER),
            query: reader.required(QUERY)?,
            rtype: reader.take_or(RTYPE, DEFAULT_RTYPE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    #[test]
    fn round_trip() {
        let config = DnsConfig {
            ctype: "IN".into(),
            nameserver: Some("8.8.8.8".into()),
            query: "example.com".into(),
            rtype: "MX".into(),
        };
        let mut bundle = CheckBundle::default();
        CheckType::Dns(config.clone()).to_api(&mut bundle).unwrap();
        assert_eq!(bundle.check_type, "dns");
        assert_eq!(CheckType::from_api(&bundle).unwrap(), CheckType::Dns(config));
    }
}
