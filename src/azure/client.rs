//! ARM Client
//!
//! Main client for interacting with Azure Resource Manager, combining
//! authentication and HTTP functionality.

use super::auth::{create_credential, get_token, token_scope};
use super::http::ArmHttpClient;
use crate::error::{status_of, ArmError};
use crate::resource::provider::ProviderDocument;
use crate::resource::{Page, ProviderMetadata, Resource, ResourceGroup, ResourceManager};
use anyhow::{Context, Result};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Public Azure cloud endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// API version of the `Microsoft.Resources` endpoints (groups, resources, providers)
pub const RESOURCES_API_VERSION: &str = "2021-04-01";

/// Main ARM client
#[derive(Clone)]
pub struct ArmClient {
    pub credential: Arc<dyn TokenCredential>,
    pub http: ArmHttpClient,
    pub subscription_id: String,
    endpoint: Url,
    scope: String,
}

impl ArmClient {
    /// Create a client authenticating through the Azure CLI
    pub fn new(subscription_id: &str, endpoint: &str) -> Result<Self> {
        let credential = create_credential()?;
        Self::with_credential(subscription_id, endpoint, credential)
    }

    /// Create a client with an explicit credential
    pub fn with_credential(
        subscription_id: &str,
        endpoint: &str,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid ARM endpoint: {}", endpoint))?;
        let http = ArmHttpClient::new()?;

        let scope = token_scope(endpoint.as_str());

        Ok(Self {
            credential,
            http,
            subscription_id: subscription_id.to_string(),
            endpoint,
            scope,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Get the current access token; the credential caches it until expiry
    pub async fn get_token(&self) -> Result<String> {
        get_token(&self.credential, &self.scope).await
    }

    /// Make a GET request to an ARM API
    pub async fn get(&self, url: &Url) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    async fn get_as<T: DeserializeOwned>(&self, url: &Url, what: &str) -> Result<T> {
        let value = self.get(url).await?;
        serde_json::from_value(value).with_context(|| format!("Failed to parse {}", what))
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build an ARM URL from an absolute path
    pub fn arm_url(&self, path: &str, api_version: &str) -> Result<Url> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}{}", base, path))
            .with_context(|| format!("Invalid ARM path: {}", path))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// Build a subscription-scoped URL
    pub fn subscription_url(&self, path: &str) -> Result<Url> {
        self.arm_url(
            &format!("/subscriptions/{}/{}", self.subscription_id, path),
            RESOURCES_API_VERSION,
        )
    }

    /// Build the resource group listing URL
    pub fn resource_groups_url(&self) -> Result<Url> {
        self.subscription_url("resourcegroups")
    }

    /// Build the URL listing resources of one group
    pub fn group_resources_url(&self, group: &str, filter: Option<&str>) -> Result<Url> {
        let mut url = self.subscription_url(&format!(
            "resourceGroups/{}/resources",
            urlencoding::encode(group)
        ))?;
        // OData wants %20 for spaces, not the form-encoded '+'
        if let Some(filter) = filter {
            let query = format!(
                "{}&%24filter={}",
                url.query().unwrap_or_default(),
                urlencoding::encode(filter)
            );
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    /// Build the provider metadata URL
    pub fn provider_url(&self, namespace: &str) -> Result<Url> {
        self.subscription_url(&format!("providers/{}", urlencoding::encode(namespace)))
    }

    /// Build the GET-by-id URL
    pub fn resource_id_url(&self, id: &str, api_version: &str) -> Result<Url> {
        if !id.starts_with('/') {
            anyhow::bail!("Resource id must be an absolute path: {}", id);
        }
        self.arm_url(id, api_version)
    }

    /// Resolve a `nextLink` continuation.
    /// Security: The bearer token is only ever sent to the configured endpoint
    fn continuation_url(&self, next_link: &str) -> Result<Url> {
        let url = Url::parse(next_link).context("Invalid nextLink")?;
        if url.scheme() != self.endpoint.scheme()
            || url.host_str() != self.endpoint.host_str()
            || url.port_or_known_default() != self.endpoint.port_or_known_default()
        {
            anyhow::bail!("nextLink points outside {}", self.endpoint);
        }
        Ok(url)
    }

    fn page_url(&self, cursor: Option<&str>, first: impl FnOnce() -> Result<Url>) -> Result<Url> {
        match cursor {
            Some(next_link) => self.continuation_url(next_link),
            None => first(),
        }
    }
}

#[async_trait]
impl ResourceManager for ArmClient {
    async fn resource_groups_page(&self, cursor: Option<&str>) -> Result<Page<ResourceGroup>> {
        let url = self.page_url(cursor, || self.resource_groups_url())?;
        self.get_as(&url, "resource group page")
            .await
            .context("Failed to list resource groups")
    }

    async fn resources_in_group_page(
        &self,
        group: &str,
        filter: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Page<Resource>> {
        let url = self.page_url(cursor, || self.group_resources_url(group, filter))?;
        self.get_as(&url, "resource page")
            .await
            .with_context(|| format!("Failed to list resources in {}", group))
    }

    async fn resource_by_id(&self, id: &str, api_version: &str) -> Result<Resource> {
        let url = self.resource_id_url(id, api_version)?;
        match self.get_as(&url, "resource").await {
            Err(err) if status_of(&err) == Some(404) => Err(ArmError::NotFound {
                id: id.to_string(),
            }
            .into()),
            other => other,
        }
    }

    async fn provider(&self, namespace: &str) -> Result<ProviderMetadata> {
        let url = self.provider_url(namespace)?;
        let document: ProviderDocument = self.get_as(&url, "provider metadata").await?;
        Ok(document.into_metadata(namespace))
    }
}
