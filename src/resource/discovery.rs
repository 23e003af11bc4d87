//! Resource Hierarchy Discovery Engine
//!
//! Composes the identifier parser, provider metadata, type matcher and fan-out:
//!
//! ```text
//! Parsing -> MetadataResolution -> TypeMatching -> FanOut -> Aggregation -> Done
//! ```
//!
//! Anything failing before `FanOut` ends the call with a logged diagnostic.
//! Failures inside the fan-out are contained per worker.

use super::fanout::{enumerate_children, EnumerationScope};
use super::id::ResourceIdentifier;
use super::manager::ResourceManager;
use super::matcher::candidates_from;
use super::model::{Resource, ResourceGroup};
use super::pager::collect_pages;
use super::provider::{resolve_all_types, resolve_type_versions};
use crate::error::ArmError;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Stages of a single discovery call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStage {
    Parsing,
    MetadataResolution,
    TypeMatching,
    FanOut,
    Aggregation,
    Done,
}

impl fmt::Display for DiscoveryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiscoveryStage::Parsing => "parsing",
            DiscoveryStage::MetadataResolution => "metadata resolution",
            DiscoveryStage::TypeMatching => "type matching",
            DiscoveryStage::FanOut => "fan-out",
            DiscoveryStage::Aggregation => "aggregation",
            DiscoveryStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Engine options
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOptions {
    pub scope: EnumerationScope,
}

/// Outcome of one discovery call
#[derive(Debug, Default)]
pub struct DiscoveryResult {
    /// Discovered resources, deduplicated by id, in no particular order
    pub resources: Vec<Resource>,
    /// Candidate types whose enumeration failed
    pub failures: BTreeMap<String, ArmError>,
}

/// A discovery error tagged with the stage it stopped at
#[derive(Debug)]
pub struct StageError {
    pub stage: DiscoveryStage,
    pub error: ArmError,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

/// Browses resource groups, resources and subresources through a [`ResourceManager`]
#[derive(Clone)]
pub struct DiscoveryEngine {
    api: Arc<dyn ResourceManager>,
    options: DiscoveryOptions,
}

impl DiscoveryEngine {
    pub fn new(api: Arc<dyn ResourceManager>, options: DiscoveryOptions) -> Self {
        Self { api, options }
    }

    pub fn options(&self) -> DiscoveryOptions {
        self.options
    }

    /// All resource groups in the subscription
    pub async fn list_groups(&self) -> Result<Vec<ResourceGroup>, ArmError> {
        let api = self.api.as_ref();
        let collected =
            collect_pages(|cursor| async move { api.resource_groups_page(cursor.as_deref()).await })
                .await;
        collected
            .into_tolerant("resource groups")
            .map_err(ArmError::from)
    }

    /// Names of all resource groups in the subscription
    pub async fn list_group_names(&self) -> Result<Vec<String>, ArmError> {
        let groups = self.list_groups().await?;
        Ok(groups.into_iter().map(|g| g.name).collect())
    }

    /// Resources in `group`, optionally narrowed by an OData filter
    pub async fn list_resources(
        &self,
        group: &str,
        filter: Option<&str>,
    ) -> Result<Vec<Resource>, ArmError> {
        let api = self.api.as_ref();
        let collected = collect_pages(|cursor| async move {
            api.resources_in_group_page(group, filter, cursor.as_deref())
                .await
        })
        .await;
        collected
            .into_tolerant(&format!("resources in {}", group))
            .map_err(ArmError::from)
    }

    /// Fetch a single resource with the newest API version its type declares
    pub async fn get_resource(&self, id: &str) -> Result<Resource, ArmError> {
        let parsed = ResourceIdentifier::parse(id)?;
        let api_version =
            resolve_type_versions(self.api.as_ref(), parsed.provider(), parsed.type_path()).await?;

        tracing::debug!("GET {} with api-version {}", parsed, api_version);

        self.api
            .resource_by_id(parsed.as_str(), &api_version)
            .await
            .map_err(|err| match err.downcast::<ArmError>() {
                Ok(ArmError::Api { status: 404, .. }) => ArmError::NotFound {
                    id: parsed.to_string(),
                },
                Ok(arm) => arm,
                Err(other) => ArmError::Remote(other),
            })
    }

    /// Best-effort subresource discovery.
    ///
    /// Never fails: errors before the fan-out are logged and yield an empty list,
    /// failing workers are logged and skipped.
    pub async fn discover_subresources(&self, id: &str) -> Vec<Resource> {
        match self.discover(id).await {
            Ok(result) => result.resources,
            Err(err) => {
                // already logged at warn by discover
                tracing::debug!("Returning no subresources for {}: {}", id, err);
                Vec::new()
            }
        }
    }

    /// Discover the subresources of `id`.
    ///
    /// Fails only when the identifier is malformed or the resource's own type
    /// cannot be resolved. A type with no declared children is an empty result.
    pub async fn discover(&self, id: &str) -> Result<DiscoveryResult, ArmError> {
        match self.run(id).await {
            Ok(result) => Ok(result),
            Err(StageError {
                error: ArmError::NoSubresourceTypes { provider, type_path },
                ..
            }) => {
                tracing::debug!(
                    "{}/{} declares no subresource types, nothing to discover",
                    provider,
                    type_path
                );
                Ok(DiscoveryResult::default())
            }
            Err(err) => {
                tracing::warn!("Discovery of {} stopped: {}", id, err);
                Err(err.error)
            }
        }
    }

    async fn run(&self, id: &str) -> Result<DiscoveryResult, StageError> {
        let api = self.api.as_ref();
        let fail = |stage: DiscoveryStage| move |error: ArmError| StageError { stage, error };

        let mut stage = DiscoveryStage::Parsing;
        tracing::debug!("Discovering subresources of {} ({})", id, stage);
        let parsed = ResourceIdentifier::parse(id).map_err(fail(stage))?;

        stage = DiscoveryStage::MetadataResolution;
        tracing::debug!("{} for provider {}", stage, parsed.provider());
        let metadata = resolve_all_types(api, parsed.provider())
            .await
            .map_err(fail(stage))?;
        metadata
            .latest_api_version(parsed.type_path())
            .map_err(fail(stage))?;

        stage = DiscoveryStage::TypeMatching;
        let candidates = candidates_from(&metadata, parsed.type_path()).map_err(fail(stage))?;
        tracing::debug!(
            "{} found {} candidate types under {}",
            stage,
            candidates.len(),
            parsed.qualified_type()
        );

        stage = DiscoveryStage::FanOut;
        tracing::debug!("{} across {} candidates", stage, candidates.len());
        let enumeration = enumerate_children(
            api,
            parsed.resource_group(),
            parsed.provider(),
            &candidates,
            self.options.scope,
        )
        .await;

        stage = DiscoveryStage::Aggregation;
        let total = enumeration.resources.len();
        let resources = dedup_by_id(enumeration.resources);
        tracing::debug!(
            "{} merged {} resources into {} unique ({} candidate failures)",
            stage,
            total,
            resources.len(),
            enumeration.failures.len()
        );

        if !enumeration.failures.is_empty() && enumeration.failures.len() == candidates.len() {
            tracing::warn!(
                "All {} enumeration workers failed for {}",
                candidates.len(),
                parsed
            );
        }

        tracing::debug!("Discovery of {} {}", parsed, DiscoveryStage::Done);
        Ok(DiscoveryResult {
            resources,
            failures: enumeration.failures,
        })
    }
}

/// Keep the first occurrence of every id (ARM ids are case-insensitive)
fn dedup_by_id(resources: Vec<Resource>) -> Vec<Resource> {
    let mut seen = HashSet::new();
    resources
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect()
}
