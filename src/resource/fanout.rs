//! Concurrent enumeration fan-out
//!
//! One worker per candidate subresource type. Workers run concurrently, share
//! nothing, and each hands back its own outcome; the join point drains all of
//! them before returning, so a failing worker never cancels its siblings.

use super::manager::ResourceManager;
use super::model::Resource;
use super::pager::collect_pages;
use crate::error::ArmError;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How each candidate's enumeration is scoped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumerationScope {
    /// Fetch every resource in the parent's group, unfiltered
    #[default]
    ResourceGroup,
    /// Narrow each enumeration with a `resourceType eq '...'` filter
    ResourceType,
}

impl EnumerationScope {
    /// OData filter for one candidate, if this scope uses one
    pub fn filter_for(self, provider: &str, candidate: &str) -> Option<String> {
        match self {
            EnumerationScope::ResourceGroup => None,
            EnumerationScope::ResourceType => {
                Some(format!("resourceType eq '{}/{}'", provider, candidate))
            }
        }
    }
}

/// Merged output of all workers
#[derive(Debug, Default)]
pub struct Enumeration {
    /// Union of every worker's resources, including partial pages
    pub resources: Vec<Resource>,
    /// Candidate type -> why its worker failed
    pub failures: BTreeMap<String, ArmError>,
}

/// What a single worker reports back
#[derive(Debug)]
enum WorkerOutcome {
    Complete(Vec<Resource>),
    Failed {
        partial: Vec<Resource>,
        error: ArmError,
    },
}

async fn enumerate_candidate(
    api: &dyn ResourceManager,
    group: &str,
    filter: Option<&str>,
    candidate: &str,
) -> WorkerOutcome {
    let collected = collect_pages(|cursor| async move {
        api.resources_in_group_page(group, filter, cursor.as_deref())
            .await
    })
    .await;

    match collected.error {
        None => WorkerOutcome::Complete(collected.items),
        Some(cause) if collected.items.is_empty() => WorkerOutcome::Failed {
            partial: Vec::new(),
            error: ArmError::EnumerationFailure {
                candidate: candidate.to_string(),
                cause,
            },
        },
        Some(cause) => WorkerOutcome::Failed {
            error: ArmError::PageFetchFailure {
                fetched: collected.items.len(),
                cause,
            },
            partial: collected.items,
        },
    }
}

/// Enumerate every candidate type in `group` concurrently and merge the results
pub async fn enumerate_children(
    api: &dyn ResourceManager,
    group: &str,
    provider: &str,
    candidates: &[String],
    scope: EnumerationScope,
) -> Enumeration {
    tracing::debug!(
        "Fanning out {} enumeration workers over group {}",
        candidates.len(),
        group
    );

    let mut workers: FuturesUnordered<_> = candidates
        .iter()
        .map(|candidate| {
            let filter = scope.filter_for(provider, candidate);
            async move {
                let outcome = enumerate_candidate(api, group, filter.as_deref(), candidate).await;
                (candidate, outcome)
            }
        })
        .collect();

    let mut enumeration = Enumeration::default();

    while let Some((candidate, outcome)) = workers.next().await {
        match outcome {
            WorkerOutcome::Complete(resources) => {
                tracing::debug!("Worker for {} returned {} resources", candidate, resources.len());
                enumeration.resources.extend(resources);
            }
            WorkerOutcome::Failed { partial, error } => {
                tracing::warn!(
                    "Enumeration of {} in group {} failed ({} resources kept): {}",
                    candidate,
                    group,
                    partial.len(),
                    error
                );
                enumeration.resources.extend(partial);
                enumeration.failures.insert(candidate.clone(), error);
            }
        }
    }

    enumeration
}
