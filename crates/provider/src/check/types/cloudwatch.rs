//! `cloudwatch` checks: AWS CloudWatch metric collection.

use std::collections::BTreeMap;

use circonus_api::CheckBundle;
use circonus_api::config::{
    API_KEY, API_SECRET, CLOUDWATCH_METRICS, DIM_PREFIX, GRANULARITY, NAMESPACE, URL, VERSION,
};
use serde::{Deserialize, Serialize};

use super::{CheckTypeConfig, or_default, put, set};
use crate::check::config_reader::ConfigReader;
use crate::error::{Error, Result};
use crate::schema::{Attribute, Block};
use crate::validators::Validator;

const DEFAULT_VERSION: &str = "2010-08-01";

/// `cloudwatch` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudwatchConfig {
    /// AWS access key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// AWS secret key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    /// CloudWatch dimensions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimmensions: BTreeMap<String, String>,
    /// Metric names to collect
    #[serde(default)]
    pub metric: Vec<String>,
    /// CloudWatch namespace
    pub namespace: String,
    /// Regional endpoint
    pub url: String,
    /// API version
    #[serde(default)]
    pub version: String,
}

impl CheckTypeConfig for CloudwatchConfig {
    fn block() -> Block {
        Block::new(vec![
            Attribute::string("api_key").sensitive().describe("AWS access key"),
            Attribute::string("api_secret").sensitive().describe("AWS secret key"),
            Attribute::string_map("dimmensions").describe("CloudWatch dimensions to include"),
            Attribute::string_set("metric")
                .validate(Validator::Regex(r".+"))
                .describe("CloudWatch metric names"),
            Attribute::string("namespace")
                .required()
                .describe("The namespace to pull metrics from, e.g. AWS/ELB"),
            Attribute::string("url")
                .required()
                .validate(Validator::HttpUrl)
                .describe("The AWS URL to pull from, e.g. https://monitoring.us-east-1.amazonaws.com"),
            Attribute::string("version")
                .default_value(DEFAULT_VERSION)
                .describe("The CloudWatch API version"),
        ])
    }

    fn to_api(&self, bundle: &mut CheckBundle) -> Result<()> {
        let granularity = match bundle.period {
            60 => "1",
            300 => "5",
            _ => {
                return Err(Error::validation(
                    "Period must be either 1m or 5m for a cloudwatch check",
                ));
            }
        };
        set(bundle, GRANULARITY, granularity);
        put(bundle, API_KEY, self.api_key.as_deref());
        put(bundle, API_SECRET, self.api_secret.as_deref());
        for (name, value) in &self.dimmensions {
            set(bundle, &format!("{DIM_PREFIX}{name}"), value);
        }
        let mut metrics = self.metric.clone();
        metrics.sort();
        metrics.dedup();
        set(bundle, CLOUDWATCH_METRICS, metrics.join(","));
        set(bundle, NAMESPACE, &self.namespace);
        set(bundle, URL, &self.url);
        set(bundle, VERSION, or_default(&self.version, DEFAULT_VERSION));
        Ok(())
    }

    fn from_api(reader: &mut ConfigReader, _bundle: &CheckBundle) -> Result<Self> {
        reader.take(GRANULARITY);
        let mut metric: Vec<String> = reader
            .take(CLOUDWATCH_METRICS)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();
        metric.sort();
        Ok(Self {
            api_key: reader.take_non_empty(API_KEY),
            api_secret: reader.take_non_empty(API_SECRET),
            dimmensions: reader.take_prefixed(DIM_PREFIX),
            metric,
            namespace: reader.required(NAMESPACE)?,
            url: reader.required(URL)?,
            version: reader.take_or(VERSION, DEFAULT_VERSION),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::types::CheckType;

    fn sample() -> CloudwatchConfig {
        CloudwatchConfig {
            api_key: Some("AKIA".into()),
            api_secret: Some("secret".into()),
            dimmensions: BTreeMap::from([("LoadBalancerName".into(), "web".into())]),
            metric: vec!["Latency".into(), "RequestCount".into()],
            namespace: "AWS/ELB".into(),
            url: "https://monitoring.us-east-1.amazonaws.com".into(),
            version: DEFAULT_VERSION.into(),
        }
    }

    #[test]
    fn round_trip() {
        let mut bundle = CheckBundle {
            period: 300,
            ..CheckBundle::default()
        };
        CheckType::Cloudwatch(sample()).to_api(&mut bundle).unwrap();
        assert_eq!(bundle.config[GRANULARITY], "5");
        assert_eq!(bundle.config["dim_LoadBalancerName"], "web");
        assert_eq!(bundle.config[CLOUDWATCH_METRICS], "Latency,RequestCount");
        assert_eq!(
            CheckType::from_api(&bundle).unwrap(),
            CheckType::Cloudwatch(sample())
        );
    }

    #[test]
    fn period_must_be_one_or_five_minutes() {
        let mut bundle = CheckBundle {
            period: 120,
            ..CheckBundle::default()
        };
        let err = sample().to_api(&mut bundle).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Period must be either 1m or 5m for a cloudwatch check"
        );

        let mut bundle = CheckBundle {
            period: 60,
            ..CheckBundle::default()
        };
        sample().to_api(&mut bundle).unwrap();
        assert_eq!(bundle.config[GRANULARITY], "1");
    }
}
