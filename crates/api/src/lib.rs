//! Circonus v2 API object model and client.
//!
//! This crate holds the wire types for the objects the Terraform provider
//! manages (check bundles, graphs, contact groups, rule sets), the CID
//! helpers used to validate and take apart identifiers, and the
//! [`CirconusApi`] trait with its reqwest-backed [`HttpClient`].
//!
//! ```rust,no_run
//! use circonus_api::{ApiConfig, CirconusApi, HttpClient};
//! use secrecy::SecretString;
//!
//! # async fn example() -> circonus_api::Result<()> {
//! let client = HttpClient::new(ApiConfig::new(SecretString::from("token".to_string())))?;
//! let bundle = client.fetch_check_bundle("/check_bundle/1234").await?;
//! println!("{}", bundle.display_name);
//! # Ok(())
//! # }
//! ```

pub mod check_bundle;
pub mod cid;
pub mod client;
pub mod codec;
pub mod config;
pub mod contact_group;
pub mod error;
pub mod graph;
pub mod rule_set;

pub use check_bundle::{CheckBundle, CheckBundleConfig, CheckBundleMetric};
pub use client::{ApiConfig, CirconusApi, DEFAULT_API_URL, DEFAULT_APP_NAME, HttpClient};
pub use contact_group::{
    ContactGroup, ContactGroupAlertFormats, ContactGroupContacts, ContactGroupContactsExternal,
    ContactGroupContactsUser, ContactGroupEscalation,
};
pub use error::{Error, Result};
pub use graph::{Graph, GraphDatapoint, GraphGuide, GraphMetricCluster};
pub use rule_set::{RuleSet, RuleSetRule};
