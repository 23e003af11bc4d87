//! Remote management API seam
//!
//! Everything the engine needs from ARM goes through [`ResourceManager`], so
//! tests can swap the HTTP client for an in-memory fake.

use super::model::{Page, Resource, ResourceGroup};
use super::provider::ProviderMetadata;
use anyhow::Result;
use async_trait::async_trait;

/// Page-level access to the ARM endpoints the engine consumes.
///
/// `cursor` is the continuation (`nextLink`) returned by the previous page,
/// or `None` for the first page.
#[async_trait]
pub trait ResourceManager: Send + Sync {
    /// List resource groups in the subscription
    async fn resource_groups_page(&self, cursor: Option<&str>) -> Result<Page<ResourceGroup>>;

    /// List resources in a group, optionally narrowed by an OData `$filter`
    async fn resources_in_group_page(
        &self,
        group: &str,
        filter: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Page<Resource>>;

    /// Fetch a single resource; a missing resource fails with `ArmError::NotFound`
    async fn resource_by_id(&self, id: &str, api_version: &str) -> Result<Resource>;

    /// Fetch the resource types a provider namespace declares
    async fn provider(&self, namespace: &str) -> Result<ProviderMetadata>;
}
