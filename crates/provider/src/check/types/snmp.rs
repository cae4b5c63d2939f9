//! `snmp` checks.
//!
//! Each OID is stored as a pair of config keys, `oid_<name>` holding the
//! path and `type_<name>` holding the metric type.

use std::collections::BTreeMap;

use circonus_api::CheckBundle;
use circonus_api::config::{COMMUNITY, OID_PREFIX, PORT, TYPE_PREFIX, VERSION};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, or_default, set};
use crate::check::config_reader::ConfigReader;
use crate::error::{Error, Result};
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_OID_TYPE: &str = "guess";
const DEFAULT_PORT: u16 = 161;
const DEFAULT_VERSION: &str = "2c";

fn default_oid_type() -> String {
    DEFAULT_OID_TYPE.to_string()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// One OID to collect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpOid {
    /// Metric name
    pub name: String,
    /// Numeric or symbolic OID
    pub path: String,
    /// Metric type, or `guess`
    #[serde(rename = "type", default = "default_oid_type")]
    pub oid_type: String,
}

/// `snmp` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpConfig {
    /// Community string
    pub community: String,
    /// OIDs to collect
    #[serde(default)]
    pub oid: Vec<SnmpOid>,
    /// SNMP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Protocol version
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            community: String::new(),
            oid: Vec::new(),
            port: DEFAULT_PORT,
            version: default_version(),
        }
    }
}

impl CheckTypeConfig for SnmpConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string("community")
                .required()
                .sensitive()
                .describe("The SNMP community string"),
            Attribute::block(
                "oid",
                Block::new(vec![
                    Attribute::string("name")
                        .required()
                        .validate(Validator::Regex(r"^[^\s]+$"))
                        .describe("The metric name the OID is stored under"),
                    Attribute::string("path")
                        .required()
                        .describe("The OID to query"),
                    Attribute::string("type")
                        .default_value(DEFAULT_OID_TYPE)
                        .validate(Validator::OneOf(&[
                            "guess", "int32", "uint32", "int64", "uint64", "double", "string",
                        ]))
                        .describe("The metric type of the OID"),
                ])
                .min_items(1),
            )
            .required(),
            Attribute::int("port")
                .default_value(DEFAULT_PORT)
                .validate(Validator::IntBetween(1, 65_535))
                .describe("The SNMP port"),
            Attribute::string("version")
                .default_value(DEFAULT_VERSION)
                .validate(Validator::OneOf(&["1", "2c", "3"]))
                .describe("The SNMP protocol version"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        set(bundle, COMMUNITY, &self.community);
        for oid in &self.oid {
            if bundle.config.contains_key(&format!("{OID_PREFIX}{}", oid.name)) {
                return Err(Error::validation(format!(
                    "snmp oid name {:?} is used more than once",
                    oid.name
                )));
            }
            set(bundle, &format!("{OID_PREFIX}{}", oid.name), &oid.path);
            set(
                bundle,
                &format!("{TYPE_PREFIX}{}", oid.name),
                or_default(&oid.oid_type, DEFAULT_OID_TYPE),
            );
        }
        set(bundle, PORT, self.port);
        set(bundle, VERSION, or_default(&self.version, DEFAULT_VERSION));
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        let paths = reader.take_prefixed(OID_PREFIX);
        let mut types: BTreeMap<String, String> = reader.take_prefixed(TYPE_PREFIX);
        let oid = paths
            .into_iter()
            .map(|(name, path)| SnmpOid {
                oid_type: types.remove(&name).unwrap_or_else(default_oid_type),
                name,
                path,
            })
            .collect();
        if let Some(orphan) = types.keys().next() {
            return Err(Error::provider_bug(format!(
                "snmp type for {orphan:?} has no matching oid"
            )));
        }
        Ok(Self {
            community: reader.required(COMMUNITY)?,
            oid,
            port: reader.take_parsed(PORT)?.unwrap_or(DEFAULT_PORT),
            version: reader.take_or(VERSION, DEFAULT_VERSION),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    fn oid(name: &str, path: &str, oid_type: &str) -> SnmpOid {
        SnmpOid {
            name: name.into(),
            path: path.into(),
            oid_type: oid_type.into(),
        }
    }

    #[test]
    fn oids_are_read_back_sorted_by_name() {
        let config = SnmpConfig {
            community: "public".into(),
            oid: vec![
                oid("uptime", "1.3.6.1.2.1.1.3.0", "guess"),
                oid("if_in", "1.3.6.1.2.1.2.2.1.10.1", "uint64"),
            ],
            ..SnmpConfig::default()
        };
        let mut bundle = CheckBundle::default();
        CheckType::Snmp(config.clone()).to_api(&mut bundle).unwrap();
        assert_eq!(bundle.config["oid_uptime"], "1.3.6.1.2.1.1.3.0");
        assert_eq!(bundle.config["type_if_in"], "uint64");

        let CheckType::Snmp(read) = CheckType::from_api(&bundle).unwrap() else {
            panic!("expected an snmp block");
        };
        assert_eq!(read.oid[0].name, "if_in");
        assert_eq!(read.oid[1].name, "uptime");
        assert_eq!(read.community, "public");
        assert_eq!(read.version, "2c");
    }

    #[test]
    fn duplicate_oid_names_are_rejected() {
        let config = SnmpConfig {
            community: "public".into(),
            oid: vec![oid("a", "1.1", "guess"), oid("a", "1.2", "guess")],
            ..SnmpConfig::default()
        };
        assert!(config.to_api(&mut CheckBundle::default()).is_err());
    }
}
