//! Terraform resources for the Circonus monitoring platform.
//!
//! Each resource module owns an attribute [`Schema`], a typed configuration
//! that maps onto the API object, and `create`/`read`/`update`/`delete`
//! entry points taking a [`ResourceData`]. [`Provider`] ties them together:
//!
//! ```rust,no_run
//! use circonus_provider::{Provider, ProviderConfig, ResourceData, ResourceKind};
//! use serde_json::json;
//!
//! # async fn example() -> circonus_provider::Result<()> {
//! let provider = Provider::configure(&ProviderConfig::from_env())?;
//! let mut data = ResourceData::new(json!({
//!     "name": "ops",
//!     "email": [{"address": "ops@example.com"}],
//! }));
//! let diags = provider.create(ResourceKind::ContactGroup, &mut data).await;
//! assert!(!diags.has_errors());
//! # Ok(())
//! # }
//! ```
//!
//! # Resources
//!
//! - `circonus_check`: a check bundle with exactly one check-type block
//! - `circonus_contact_group`: notification targets and per-severity alert options
//! - `circonus_graph`: a graph of metric datapoints and metric clusters
//! - `circonus_rule_set`: alerting rules for one metric of a check
//! - `circonus_metric`: a metric description kept only in state

pub mod block;
pub mod check;
pub mod contact_group;
pub mod diagnostics;
pub mod duration;
pub mod error;
pub mod graph;
pub mod logging;
pub mod metric;
pub mod provider;
pub mod resource_data;
pub mod rule_set;
pub mod schema;
pub mod tags;
pub mod validators;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{Error, Result};
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use provider::{Provider, ProviderConfig, ResourceKind};
pub use resource_data::ResourceData;
pub use schema::{Attribute, Block, Schema};
