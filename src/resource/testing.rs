//! In-memory `ResourceManager` for unit tests

use super::manager::ResourceManager;
use super::model::{Page, Resource, ResourceGroup};
use super::provider::ProviderMetadata;
use crate::error::ArmError;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Map;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

#[derive(Default)]
pub(crate) struct FakeResourceManager {
    groups: Vec<ResourceGroup>,
    resources: HashMap<String, Vec<Resource>>,
    providers: HashMap<String, ProviderMetadata>,
    page_size: Option<usize>,
    failing_filters: HashSet<String>,
    failing_first_pages: usize,
    failing_page: Option<usize>,
    first_page_barrier: Option<Arc<Barrier>>,
    group_calls: AtomicUsize,
    enumeration_calls: AtomicUsize,
    first_page_calls: AtomicUsize,
    get_calls: AtomicUsize,
    provider_calls: AtomicUsize,
    filters_seen: Mutex<Vec<Option<String>>>,
    api_versions_seen: Mutex<Vec<String>>,
}

pub(crate) fn resource(id: &str, resource_type: &str) -> Resource {
    Resource {
        id: id.to_string(),
        name: id.rsplit('/').next().unwrap_or(id).to_string(),
        resource_type: resource_type.to_string(),
        extra: Map::new(),
    }
}

pub(crate) fn group(name: &str) -> ResourceGroup {
    ResourceGroup {
        id: format!("/subscriptions/S/resourceGroups/{name}"),
        name: name.to_string(),
        location: "westeurope".to_string(),
        managed_by: None,
        tags: HashMap::new(),
        properties: None,
    }
}

impl FakeResourceManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_groups(mut self, names: &[&str]) -> Self {
        self.groups = names.iter().map(|n| group(n)).collect();
        self
    }

    pub(crate) fn with_resources(mut self, group: &str, resources: Vec<Resource>) -> Self {
        self.resources
            .entry(group.to_ascii_lowercase())
            .or_default()
            .extend(resources);
        self
    }

    pub(crate) fn with_provider(mut self, metadata: ProviderMetadata) -> Self {
        self.providers
            .insert(metadata.namespace.to_ascii_lowercase(), metadata);
        self
    }

    pub(crate) fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Fail every enumeration that carries this `$filter`
    pub(crate) fn failing_filter(mut self, filter: &str) -> Self {
        self.failing_filters.insert(filter.to_string());
        self
    }

    /// Fail the first `n` enumerations outright
    pub(crate) fn failing_first_pages(mut self, n: usize) -> Self {
        self.failing_first_pages = n;
        self
    }

    /// Fail whenever page `index` (0-based) of an enumeration is requested
    pub(crate) fn failing_page(mut self, index: usize) -> Self {
        self.failing_page = Some(index);
        self
    }

    /// Hold every first-page enumeration until `n` of them are in flight
    pub(crate) fn with_first_page_barrier(mut self, n: usize) -> Self {
        self.first_page_barrier = Some(Arc::new(Barrier::new(n)));
        self
    }

    pub(crate) fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn enumeration_calls(&self) -> usize {
        self.enumeration_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn filters_seen(&self) -> Vec<Option<String>> {
        self.filters_seen.lock().unwrap().clone()
    }

    pub(crate) fn api_versions_seen(&self) -> Vec<String> {
        self.api_versions_seen.lock().unwrap().clone()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.group_calls.load(Ordering::SeqCst)
            + self.enumeration_calls()
            + self.get_calls.load(Ordering::SeqCst)
            + self.provider_calls()
    }

    fn page_of<T: Clone>(&self, items: &[T], cursor: Option<&str>) -> Result<(usize, Page<T>)> {
        let index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page:")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| anyhow::anyhow!("bad cursor {c}"))?,
        };
        let Some(size) = self.page_size else {
            return Ok((index, Page::last(items.to_vec())));
        };
        let chunk: Vec<T> = items.iter().skip(index * size).take(size).cloned().collect();
        let next = ((index + 1) * size < items.len()).then(|| format!("page:{}", index + 1));
        Ok((index, Page::new(chunk, next)))
    }
}

#[async_trait]
impl ResourceManager for FakeResourceManager {
    async fn resource_groups_page(&self, cursor: Option<&str>) -> Result<Page<ResourceGroup>> {
        self.group_calls.fetch_add(1, Ordering::SeqCst);
        let (_, page) = self.page_of(&self.groups, cursor)?;
        Ok(page)
    }

    async fn resources_in_group_page(
        &self,
        group: &str,
        filter: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Page<Resource>> {
        self.enumeration_calls.fetch_add(1, Ordering::SeqCst);
        self.filters_seen
            .lock()
            .unwrap()
            .push(filter.map(str::to_string));
        tokio::task::yield_now().await;

        if let (None, Some(barrier)) = (cursor, &self.first_page_barrier) {
            barrier.wait().await;
        }

        if cursor.is_none()
            && self.first_page_calls.fetch_add(1, Ordering::SeqCst) < self.failing_first_pages
        {
            anyhow::bail!("API request failed: 500");
        }
        if filter.is_some_and(|f| self.failing_filters.contains(f)) {
            anyhow::bail!("API request failed: 400");
        }

        let items = self
            .resources
            .get(&group.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default();
        let (index, page) = self.page_of(&items, cursor)?;
        if self.failing_page == Some(index) {
            anyhow::bail!("API request failed: 503");
        }
        Ok(page)
    }

    async fn resource_by_id(&self, id: &str, api_version: &str) -> Result<Resource> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.api_versions_seen
            .lock()
            .unwrap()
            .push(api_version.to_string());

        self.resources
            .values()
            .flatten()
            .find(|r| r.id.eq_ignore_ascii_case(id))
            .cloned()
            .ok_or_else(|| ArmError::NotFound { id: id.to_string() }.into())
    }

    async fn provider(&self, namespace: &str) -> Result<ProviderMetadata> {
        self.provider_calls.fetch_add(1, Ordering::SeqCst);
        self.providers
            .get(&namespace.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| {
                ArmError::Api {
                    status: 404,
                    code: Some("InvalidResourceNamespace".to_string()),
                    message: None,
                }
                .into()
            })
    }
}
