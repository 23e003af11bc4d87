//! ARM record types
//!
//! Resource groups and resources are kept mostly provider-opaque: the fields
//! the engine needs are lifted out and everything else rides along in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Resource group information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "managedBy", default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ResourceGroupProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

impl ResourceGroup {
    /// Provisioning state, or "Unknown" when ARM omitted it
    pub fn provisioning_state(&self) -> &str {
        self.properties
            .as_ref()
            .and_then(|p| p.provisioning_state.as_deref())
            .unwrap_or("Unknown")
    }
}

/// A single ARM resource description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    /// Look up a provider-specific top-level field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Key used to deduplicate resources; ARM ids are case-insensitive
    pub(crate) fn dedup_key(&self) -> String {
        self.id.to_ascii_lowercase()
    }
}

/// One page of a paginated ARM listing
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

impl<T> Page<T> {
    pub fn new(value: Vec<T>, next_link: Option<String>) -> Self {
        Self { value, next_link }
    }

    /// Final page with no continuation
    pub fn last(value: Vec<T>) -> Self {
        Self::new(value, None)
    }
}
