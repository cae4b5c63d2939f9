//! The API client seam and its HTTP implementation.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::check_bundle::CheckBundle;
use crate::contact_group::ContactGroup;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::rule_set::RuleSet;

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.circonus.com/v2";
/// Default application name sent with every request.
pub const DEFAULT_APP_NAME: &str = "terraform-provider-circonus";

const AUTH_TOKEN_HEADER: &str = "X-Circonus-Auth-Token";
const APP_NAME_HEADER: &str = "X-Circonus-App-Name";

/// Operations the provider needs from the Circonus API.
///
/// Every object is addressed by its CID. Implementations return
/// [`Error::NotFound`] when the API reports the object is gone.
#[async_trait]
pub trait CirconusApi: Send + Sync {
    /// Create a check bundle, returning the stored object.
    async fn create_check_bundle(&self, bundle: &CheckBundle) -> Result<CheckBundle>;
    /// Fetch a check bundle by CID.
    async fn fetch_check_bundle(&self, cid: &str) -> Result<CheckBundle>;
    /// Replace a check bundle; `bundle.cid` selects the target.
    async fn update_check_bundle(&self, bundle: &CheckBundle) -> Result<CheckBundle>;
    /// Delete a check bundle by CID.
    async fn delete_check_bundle(&self, cid: &str) -> Result<()>;

    /// Create a graph.
    async fn create_graph(&self, graph: &Graph) -> Result<Graph>;
    /// Fetch a graph by CID.
    async fn fetch_graph(&self, cid: &str) -> Result<Graph>;
    /// Replace a graph.
    async fn update_graph(&self, graph: &Graph) -> Result<Graph>;
    /// Delete a graph by CID.
    async fn delete_graph(&self, cid: &str) -> Result<()>;

    /// Create a contact group.
    async fn create_contact_group(&self, group: &ContactGroup) -> Result<ContactGroup>;
    /// Fetch a contact group by CID.
    async fn fetch_contact_group(&self, cid: &str) -> Result<ContactGroup>;
    /// Replace a contact group.
    async fn update_contact_group(&self, group: &ContactGroup) -> Result<ContactGroup>;
    /// Delete a contact group by CID.
    async fn delete_contact_group(&self, cid: &str) -> Result<()>;

    /// Create a rule set.
    async fn create_rule_set(&self, rule_set: &RuleSet) -> Result<RuleSet>;
    /// Fetch a rule set by CID.
    async fn fetch_rule_set(&self, cid: &str) -> Result<RuleSet>;
    /// Replace a rule set.
    async fn update_rule_set(&self, rule_set: &RuleSet) -> Result<RuleSet>;
    /// Delete a rule set by CID.
    async fn delete_rule_set(&self, cid: &str) -> Result<()>;
}

/// Connection settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.circonus.com/v2`
    pub api_url: String,
    /// API token
    pub key: SecretString,
    /// Application name registered with the token
    pub app_name: String,
}

impl ApiConfig {
    /// Settings for the public endpoint with the given token.
    #[must_use]
    pub fn new(key: SecretString) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            key,
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

/// [`CirconusApi`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    key: SecretString,
    app_name: String,
}

impl HttpClient {
    /// Build a client.
    ///
    /// # Errors
    ///
    /// Fails when the token or URL is empty, or the TLS backend cannot start.
    pub fn new(config: ApiConfig) -> Result<Self> {
        if config.key.expose_secret().is_empty() {
            return Err(Error::configuration("API token is empty"));
        }
        let base_url = config.api_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::configuration("API URL is empty"));
        }

        let client = Client::builder()
            .user_agent(config.app_name.clone())
            .build()?;

        Ok(Self {
            client,
            base_url,
            key: config.key,
            app_name: config.app_name,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, self.key.expose_secret())
            .header(APP_NAME_HEADER, &self.app_name)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn check(method: &Method, path: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                cid: path.to_string(),
            });
        }
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown").to_string()
        } else {
            body
        };
        Err(Error::Api {
            method: method.to_string(),
            path: path.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%method, path, "Circonus API request");
        let mut request = self.request(method.clone(), path);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = Self::check(&method, path, request.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn create<T>(&self, collection: &str, object: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        self.send(Method::POST, collection, Some(object)).await
    }

    async fn fetch<T: DeserializeOwned>(&self, cid: &str) -> Result<T> {
        self.send::<(), T>(Method::GET, cid, None).await
    }

    async fn update<T>(&self, cid: &str, object: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        if cid.is_empty() {
            return Err(Error::configuration("cannot update an object without a CID"));
        }
        self.send(Method::PUT, cid, Some(object)).await
    }

    async fn delete(&self, cid: &str) -> Result<()> {
        debug!(path = cid, "Circonus API delete");
        let response = self.request(Method::DELETE, cid).send().await?;
        Self::check(&Method::DELETE, cid, response).await?;
        Ok(())
    }
}

#[async_trait]
impl CirconusApi for HttpClient {
    #[instrument(name = "create_check_bundle", skip(self, bundle))]
    async fn create_check_bundle(&self, bundle: &CheckBundle) -> Result<CheckBundle> {
        self.create("/check_bundle", bundle).await
    }

    #[instrument(name = "fetch_check_bundle", skip(self))]
    async fn fetch_check_bundle(&self, cid: &str) -> Result<CheckBundle> {
        self.fetch(cid).await
    }

    #[instrument(name = "update_check_bundle", skip(self, bundle), fields(cid = %bundle.cid))]
    async fn update_check_bundle(&self, bundle: &CheckBundle) -> Result<CheckBundle> {
        self.update(&bundle.cid, bundle).await
    }

    #[instrument(name = "delete_check_bundle", skip(self))]
    async fn delete_check_bundle(&self, cid: &str) -> Result<()> {
        self.delete(cid).await
    }

    #[instrument(name = "create_graph", skip(self, graph))]
    async fn create_graph(&self, graph: &Graph) -> Result<Graph> {
        self.create("/graph", graph).await
    }

    #[instrument(name = "fetch_graph", skip(self))]
    async fn fetch_graph(&self, cid: &str) -> Result<Graph> {
        self.fetch(cid).await
    }

    #[instrument(name = "update_graph", skip(self, graph), fields(cid = %graph.cid))]
    async fn update_graph(&self, graph: &Graph) -> Result<Graph> {
        self.update(&graph.cid, graph).await
    }

    #[instrument(name = "delete_graph", skip(self))]
    async fn delete_graph(&self, cid: &str) -> Result<()> {
        self.delete(cid).await
    }

    #[instrument(name = "create_contact_group", skip(self, group))]
    async fn create_contact_group(&self, group: &ContactGroup) -> Result<ContactGroup> {
        self.create("/contact_group", group).await
    }

    #[instrument(name = "fetch_contact_group", skip(self))]
    async fn fetch_contact_group(&self, cid: &str) -> Result<ContactGroup> {
        self.fetch(cid).await
    }

    #[instrument(name = "update_contact_group", skip(self, group), fields(cid = %group.cid))]
    async fn update_contact_group(&self, group: &ContactGroup) -> Result<ContactGroup> {
        self.update(&group.cid, group).await
    }

    #[instrument(name = "delete_contact_group", skip(self))]
    async fn delete_contact_group(&self, cid: &str) -> Result<()> {
        self.delete(cid).await
    }

    #[instrument(name = "create_rule_set", skip(self, rule_set))]
    async fn create_rule_set(&self, rule_set: &RuleSet) -> Result<RuleSet> {
        self.create("/rule_set", rule_set).await
    }

    #[instrument(name = "fetch_rule_set", skip(self))]
    async fn fetch_rule_set(&self, cid: &str) -> Result<RuleSet> {
        self.fetch(cid).await
    }

    #[instrument(name = "update_rule_set", skip(self, rule_set), fields(cid = %rule_set.cid))]
    async fn update_rule_set(&self, rule_set: &RuleSet) -> Result<RuleSet> {
        self.update(&rule_set.cid, rule_set).await
    }

    #[instrument(name = "delete_rule_set", skip(self))]
    async fn delete_rule_set(&self, cid: &str) -> Result<()> {
        self.delete(cid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_token() {
        let err = HttpClient::new(ApiConfig::new(SecretString::from(String::new()))).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn trims_trailing_slash() {
        let mut config = ApiConfig::new(SecretString::from("token".to_string()));
        config.api_url = "https://api.example.com/v2/".into();
        let client = HttpClient::new(config).unwrap();
        assert_eq!(client.base_url, "https://api.example.com/v2");
    }
}
