//! Provider configuration and the resource dispatcher.
//!
//! The host hands every CRUD call to [`Provider`] together with the resource
//! type name. The provider fills schema defaults, validates the
//! configuration and routes the call to the resource module. Failures come
//! back as diagnostics, never as panics.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use circonus_api::{ApiConfig, CirconusApi, DEFAULT_API_URL, DEFAULT_APP_NAME, HttpClient};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Error, Result};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};
use crate::validators::Validator;
use crate::{check, contact_group, graph, metric, rule_set};

/// Environment variable holding the API token.
pub const API_TOKEN_ENV: &str = "CIRCONUS_API_TOKEN";
/// Environment variable overriding the API URL.
pub const API_URL_ENV: &str = "CIRCONUS_API_URL";

static PROVIDER_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        Attribute::string("key")
            .sensitive()
            .describe("API token used to authenticate with the Circonus API"),
        Attribute::string("api_url")
            .validate(Validator::HttpUrl)
            .describe("Base URL of the Circonus API"),
        Attribute::string("app_name")
            .validate(Validator::Regex(r".+"))
            .describe("Application name registered with the API token"),
    ])
});

/// Schema of the `provider "circonus"` block.
#[must_use]
pub fn provider_schema() -> &'static Schema {
    &PROVIDER_SCHEMA
}

fn secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|key| !key.is_empty())
        .map(SecretString::from))
}

/// Settings from the provider block.
///
/// Unset attributes fall back to the environment, then to the public
/// endpoint defaults.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API token
    #[serde(deserialize_with = "secret")]
    pub key: Option<SecretString>,
    /// API base URL
    pub api_url: Option<String>,
    /// Application name sent with every request
    pub app_name: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .field("app_name", &self.app_name)
            .finish()
    }
}

impl ProviderConfig {
    /// Read settings from the environment only.
    ///
    /// Reads:
    /// - `CIRCONUS_API_TOKEN`: API token
    /// - `CIRCONUS_API_URL`: API base URL
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_defaults()
    }

    /// Decode the provider block and fill unset attributes from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Fails when the block does not decode.
    pub fn from_value(value: &Value) -> Result<Self> {
        let config = Self::deserialize(value)?;
        Ok(config.with_env_defaults())
    }

    /// Fill unset attributes from the environment.
    #[must_use]
    pub fn with_env_defaults(mut self) -> Self {
        if self.key.is_none() {
            self.key = std::env::var(API_TOKEN_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .map(SecretString::from);
        }
        if self.api_url.as_deref().is_none_or(str::is_empty) {
            self.api_url = std::env::var(API_URL_ENV).ok().filter(|v| !v.is_empty());
        }
        self
    }

    /// Effective API URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_API_URL)
    }

    /// Effective application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        self.app_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_APP_NAME)
    }

    /// Check the settings before any API call is made.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the token is missing or the URL is not
    /// an absolute HTTP(S) URL.
    pub fn validate(&self) -> Result<()> {
        match &self.key {
            Some(key) if !key.expose_secret().trim().is_empty() => {}
            _ => {
                return Err(Error::config(format!(
                    "API token is required; set \"key\" or {API_TOKEN_ENV}"
                )));
            }
        }
        Validator::HttpUrl
            .check(&Value::String(self.api_url().to_string()))
            .map_err(|reason| Error::config(format!("invalid api_url: {reason}")))
    }

    /// Connection settings for the HTTP client.
    ///
    /// # Errors
    ///
    /// Fails when [`validate`](Self::validate) does.
    pub fn api_config(&self) -> Result<ApiConfig> {
        self.validate()?;
        let key = self
            .key
            .clone()
            .ok_or_else(|| Error::config("API token is required"))?;
        Ok(ApiConfig {
            api_url: self.api_url().to_string(),
            key,
            app_name: self.app_name().to_string(),
        })
    }
}

/// The resource types this provider manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `circonus_check`
    Check,
    /// `circonus_contact_group`
    ContactGroup,
    /// `circonus_graph`
    Graph,
    /// `circonus_metric`
    Metric,
    /// `circonus_rule_set`
    RuleSet,
}

impl ResourceKind {
    /// Every resource type.
    pub const ALL: [Self; 5] = [
        Self::Check,
        Self::ContactGroup,
        Self::Graph,
        Self::Metric,
        Self::RuleSet,
    ];

    /// Terraform type name.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Check => "circonus_check",
            Self::ContactGroup => "circonus_contact_group",
            Self::Graph => "circonus_graph",
            Self::Metric => "circonus_metric",
            Self::RuleSet => "circonus_rule_set",
        }
    }

    /// Attribute schema.
    #[must_use]
    pub fn schema(self) -> &'static Schema {
        match self {
            Self::Check => check::schema(),
            Self::ContactGroup => contact_group::schema(),
            Self::Graph => graph::schema(),
            Self::Metric => metric::schema(),
            Self::RuleSet => rule_set::schema(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| format!("Unknown resource type: {s}"))
    }
}

fn finish(result: Result<Diagnostics>, mut diags: Diagnostics) -> Diagnostics {
    match result {
        Ok(more) => diags.extend(more),
        Err(err) => {
            warn!(error = %err, "Resource operation failed");
            diags.push(Diagnostic::from(&err));
        }
    }
    diags
}

/// A configured provider instance.
#[derive(Clone)]
pub struct Provider {
    client: Arc<dyn CirconusApi>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider").finish_non_exhaustive()
    }
}

impl Provider {
    /// A provider talking to `client`.
    #[must_use]
    pub fn new(client: Arc<dyn CirconusApi>) -> Self {
        Self { client }
    }

    /// Build a provider with an HTTP client from `config`.
    ///
    /// # Errors
    ///
    /// Fails on invalid settings or when the HTTP client cannot be built.
    #[instrument(name = "provider_configure", skip_all, fields(api_url = config.api_url()))]
    pub fn configure(config: &ProviderConfig) -> Result<Self> {
        let api_config = config.api_config()?;
        let client = HttpClient::new(api_config)
            .map_err(|e| Error::config(format!("unable to build API client: {e}")))?;
        debug!(app_name = config.app_name(), "Provider configured");
        Ok(Self::new(Arc::new(client)))
    }

    /// Fill defaults and validate a resource configuration.
    #[must_use]
    pub fn validate(kind: ResourceKind, config: &Value) -> Diagnostics {
        let schema = kind.schema();
        schema.validate(&schema.apply_defaults(config))
    }

    fn prepare(kind: ResourceKind, data: &mut ResourceData) -> Diagnostics {
        let schema = kind.schema();
        let config = schema.apply_defaults(data.config());
        let diags = schema.validate(&config);
        data.set_config(config);
        diags
    }

    /// Create a resource.
    #[instrument(name = "provider_create", skip_all, fields(kind = %kind))]
    pub async fn create(&self, kind: ResourceKind, data: &mut ResourceData) -> Diagnostics {
        let diags = Self::prepare(kind, data);
        if diags.has_errors() {
            return diags;
        }
        let client = self.client.as_ref();
        let result = match kind {
            ResourceKind::Check => check::create(client, data).await,
            ResourceKind::ContactGroup => contact_group::create(client, data).await,
            ResourceKind::Graph => graph::create(client, data).await,
            ResourceKind::Metric => metric::create(data),
            ResourceKind::RuleSet => rule_set::create(client, data).await,
        };
        finish(result, diags)
    }

    /// Refresh a resource's state.
    #[instrument(name = "provider_read", skip_all, fields(kind = %kind, id = data.id()))]
    pub async fn read(&self, kind: ResourceKind, data: &mut ResourceData) -> Diagnostics {
        let schema = kind.schema();
        data.set_config(schema.apply_defaults(data.config()));
        let client = self.client.as_ref();
        let result = match kind {
            ResourceKind::Check => check::read(client, data).await,
            ResourceKind::ContactGroup => contact_group::read(client, data).await,
            ResourceKind::Graph => graph::read(client, data).await,
            ResourceKind::Metric => metric::read(data),
            ResourceKind::RuleSet => rule_set::read(client, data).await,
        };
        finish(result, Diagnostics::new())
    }

    /// Apply a changed configuration.
    #[instrument(name = "provider_update", skip_all, fields(kind = %kind, id = data.id()))]
    pub async fn update(&self, kind: ResourceKind, data: &mut ResourceData) -> Diagnostics {
        let diags = Self::prepare(kind, data);
        if diags.has_errors() {
            return diags;
        }
        let client = self.client.as_ref();
        let result = match kind {
            ResourceKind::Check => check::update(client, data).await,
            ResourceKind::ContactGroup => contact_group::update(client, data).await,
            ResourceKind::Graph => graph::update(client, data).await,
            ResourceKind::Metric => metric::update(data),
            ResourceKind::RuleSet => rule_set::update(client, data).await,
        };
        finish(result, diags)
    }

    /// Destroy a resource.
    #[instrument(name = "provider_delete", skip_all, fields(kind = %kind, id = data.id()))]
    pub async fn delete(&self, kind: ResourceKind, data: &mut ResourceData) -> Diagnostics {
        let client = self.client.as_ref();
        let result = match kind {
            ResourceKind::Check => check::delete(client, data).await,
            ResourceKind::ContactGroup => contact_group::delete(client, data).await,
            ResourceKind::Graph => graph::delete(client, data).await,
            ResourceKind::Metric => Ok(metric::delete(data)),
            ResourceKind::RuleSet => rule_set::delete(client, data).await,
        };
        finish(result, Diagnostics::new())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resource_kinds_round_trip_their_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.type_name().parse::<ResourceKind>(), Ok(kind));
            assert!(!kind.schema().attributes().is_empty());
        }
        assert!("circonus_dashboard".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn explicit_settings_win_over_defaults() {
        let config = ProviderConfig {
            key: Some(SecretString::from("abc".to_string())),
            api_url: Some("https://circonus.example.com/api".into()),
            app_name: Some("ops-terraform".into()),
        };
        let api = config.api_config().unwrap();
        assert_eq!(api.api_url, "https://circonus.example.com/api");
        assert_eq!(api.app_name, "ops-terraform");
        assert_eq!(api.key.expose_secret(), "abc");
    }

    #[test]
    fn defaults_fill_unset_settings() {
        let config = ProviderConfig {
            key: Some(SecretString::from("abc".to_string())),
            ..ProviderConfig::default()
        };
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert_eq!(config.app_name(), DEFAULT_APP_NAME);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_token_and_bad_url() {
        let err = ProviderConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("API token is required"));

        let config = ProviderConfig {
            key: Some(SecretString::from("abc".to_string())),
            api_url: Some("ftp://api.circonus.com".into()),
            app_name: None,
        };
        assert!(config.validate().unwrap_err().to_string().contains("invalid api_url"));
    }

    #[test]
    fn debug_output_hides_the_token() {
        let config = ProviderConfig {
            key: Some(SecretString::from("super-secret".to_string())),
            ..ProviderConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn provider_schema_marks_the_key_sensitive() {
        let redacted = provider_schema().redacted(&json!({"key": "abc", "app_name": "x"}));
        assert_ne!(redacted["key"], json!("abc"));
        assert_eq!(redacted["app_name"], json!("x"));
    }

    #[test]
    fn validate_applies_defaults_first() {
        let diags = Provider::validate(
            ResourceKind::Metric,
            &json!({"name": "duration", "type": "numeric"}),
        );
        assert!(diags.is_empty());

        let diags = Provider::validate(ResourceKind::RuleSet, &json!({"check": "/check/1"}));
        assert!(diags.has_errors());
    }
}
