//! Subresource type matching
//!
//! ARM has no "children of" endpoint, so child types are inferred from the
//! provider's declared type paths: `virtualNetworks/subnets` is a child of
//! `virtualNetworks`.

use super::id::ResourceTypePath;
use super::manager::ResourceManager;
use super::provider::{resolve_all_types, ProviderMetadata};
use crate::error::ArmError;

/// Candidate subresource types of `parent` from already-fetched metadata
pub fn candidates_from(
    metadata: &ProviderMetadata,
    parent: &ResourceTypePath,
) -> Result<Vec<String>, ArmError> {
    let candidates = metadata.child_types(parent);
    if candidates.is_empty() {
        return Err(ArmError::NoSubresourceTypes {
            provider: metadata.namespace.clone(),
            type_path: parent.to_string(),
        });
    }
    Ok(candidates)
}

/// Fetch `provider`'s metadata and return the types nested strictly below `parent`
pub async fn match_children(
    api: &dyn ResourceManager,
    provider: &str,
    parent: &ResourceTypePath,
) -> Result<Vec<String>, ArmError> {
    let metadata = resolve_all_types(api, provider).await?;
    let candidates = candidates_from(&metadata, parent)?;
    tracing::debug!(
        "{} subresource types under {}/{}: {:?}",
        candidates.len(),
        provider,
        parent,
        candidates
    );
    Ok(candidates)
}
