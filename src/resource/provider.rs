//! Provider metadata
//!
//! Resolves which resource types a provider namespace declares and which API
//! versions each type supports. Metadata is fetched per call and never cached.

use super::id::ResourceTypePath;
use super::manager::ResourceManager;
use crate::error::ArmError;
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Declared resource types of one provider namespace
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderMetadata {
    pub namespace: String,
    /// type path -> API versions, newest first as ARM orders them
    pub resource_types: BTreeMap<String, Vec<String>>,
}

impl ProviderMetadata {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            resource_types: BTreeMap::new(),
        }
    }

    /// Builder-style helper to declare a type
    pub fn with_type(mut self, type_path: &str, api_versions: &[&str]) -> Self {
        self.resource_types.insert(
            type_path.to_string(),
            api_versions.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Versions declared for `type_path`, matched case-insensitively
    pub fn versions(&self, type_path: &ResourceTypePath) -> Option<&[String]> {
        self.resource_types
            .iter()
            .find(|(declared, _)| type_path.matches(declared))
            .map(|(_, versions)| versions.as_slice())
    }

    /// Newest API version for `type_path`.
    ///
    /// No semantic version comparison is done; ARM's ordering is trusted.
    pub fn latest_api_version(&self, type_path: &ResourceTypePath) -> Result<&str, ArmError> {
        let versions = self
            .versions(type_path)
            .ok_or_else(|| ArmError::UnknownResourceType {
                provider: self.namespace.clone(),
                type_path: type_path.to_string(),
            })?;

        versions
            .first()
            .map(String::as_str)
            .ok_or_else(|| ArmError::NoApiVersion {
                provider: self.namespace.clone(),
                type_path: type_path.to_string(),
            })
    }

    /// Declared types nested strictly below `parent` that have a usable API version
    pub fn child_types(&self, parent: &ResourceTypePath) -> Vec<String> {
        self.resource_types
            .iter()
            .filter(|(declared, versions)| !versions.is_empty() && parent.is_parent_of(declared))
            .map(|(declared, _)| declared.clone())
            .collect()
    }
}

/// Wire shape of `GET /subscriptions/{sub}/providers/{namespace}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProviderDocument {
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    resource_types: Vec<ResourceTypeDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceTypeDocument {
    resource_type: String,
    #[serde(default)]
    api_versions: Vec<String>,
}

impl ProviderDocument {
    pub(crate) fn into_metadata(self, requested: &str) -> ProviderMetadata {
        let namespace = if self.namespace.is_empty() {
            requested.to_string()
        } else {
            self.namespace
        };

        let mut resource_types = BTreeMap::new();
        for rt in self.resource_types {
            resource_types.entry(rt.resource_type).or_insert(rt.api_versions);
        }

        ProviderMetadata {
            namespace,
            resource_types,
        }
    }
}

/// Fetch every declared type of `provider` with its API versions
pub async fn resolve_all_types(
    api: &dyn ResourceManager,
    provider: &str,
) -> Result<ProviderMetadata, ArmError> {
    tracing::debug!("Resolving resource types for provider {}", provider);

    let metadata = api
        .provider(provider)
        .await
        .with_context(|| format!("Failed to get provider {}", provider))?;

    tracing::debug!(
        "Provider {} declares {} resource types",
        metadata.namespace,
        metadata.resource_types.len()
    );
    Ok(metadata)
}

/// Resolve the API version to use for `type_path` under `provider`
pub async fn resolve_type_versions(
    api: &dyn ResourceManager,
    provider: &str,
    type_path: &ResourceTypePath,
) -> Result<String, ArmError> {
    let metadata = resolve_all_types(api, provider).await?;
    metadata.latest_api_version(type_path).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::FakeResourceManager;
    use serde_json::json;

    fn network() -> ProviderMetadata {
        ProviderMetadata::new("Microsoft.Network")
            .with_type("virtualNetworks", &["2024-01-01", "2023-09-01"])
            .with_type("virtualNetworks/subnets", &["2024-01-01"])
            .with_type("virtualNetworks/taps", &[])
            .with_type("networkInterfaces", &["2024-01-01"])
    }

    #[test]
    fn test_latest_api_version_is_first_entry() {
        let version = network()
            .latest_api_version(&ResourceTypePath::new("virtualNetworks"))
            .unwrap()
            .to_string();
        assert_eq!(version, "2024-01-01");
    }

    #[test]
    fn test_latest_api_version_is_case_insensitive() {
        let metadata = network();
        let version = metadata
            .latest_api_version(&ResourceTypePath::new("VirtualNetworks/Subnets"))
            .unwrap();
        assert_eq!(version, "2024-01-01");
    }

    #[test]
    fn test_unknown_type() {
        let err = network()
            .latest_api_version(&ResourceTypePath::new("loadBalancers"))
            .unwrap_err();
        assert!(matches!(err, ArmError::UnknownResourceType { .. }));
    }

    #[test]
    fn test_type_without_versions() {
        let err = network()
            .latest_api_version(&ResourceTypePath::new("virtualNetworks/taps"))
            .unwrap_err();
        assert!(matches!(err, ArmError::NoApiVersion { .. }));
    }

    #[test]
    fn test_document_conversion_keeps_version_order() {
        let doc: ProviderDocument = serde_json::from_value(json!({
            "namespace": "Microsoft.Storage",
            "resourceTypes": [
                {"resourceType": "storageAccounts", "apiVersions": ["2023-05-01", "2022-09-01"]},
                {"resourceType": "storageAccounts/blobServices"}
            ]
        }))
        .unwrap();

        let metadata = doc.into_metadata("microsoft.storage");
        assert_eq!(metadata.namespace, "Microsoft.Storage");
        assert_eq!(
            metadata.resource_types["storageAccounts"],
            vec!["2023-05-01", "2022-09-01"]
        );
        assert!(metadata.resource_types["storageAccounts/blobServices"].is_empty());
    }

    #[tokio::test]
    async fn test_resolve_type_versions_fetches_once() {
        let api = FakeResourceManager::new().with_provider(network());

        let version = resolve_type_versions(
            &api,
            "Microsoft.Network",
            &ResourceTypePath::new("virtualNetworks/subnets"),
        )
        .await
        .unwrap();

        assert_eq!(version, "2024-01-01");
        assert_eq!(api.provider_calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_all_types_propagates_remote_failure() {
        let api = FakeResourceManager::new();

        let err = resolve_all_types(&api, "Microsoft.Unknown").await.unwrap_err();
        assert!(matches!(err, ArmError::Remote(_)));
    }
}
