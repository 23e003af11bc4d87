//! Resource identifier parsing
//!
//! ARM ids look like
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}/{name}[/{subtype}/{subname}]...`.
//! Splitting on `/` keeps the leading empty segment, so the provider namespace
//! sits at offset 6 and the top-level type at offset 7.

use crate::error::ArmError;
use std::fmt;
use std::str::FromStr;

/// Minimum number of `/`-separated segments (leading empty one included)
pub const MIN_SEGMENTS: usize = 8;

const SUBSCRIPTION_OFFSET: usize = 2;
const GROUP_OFFSET: usize = 4;
const PROVIDER_OFFSET: usize = 6;
const TYPE_OFFSET: usize = 7;

/// Literal segments and where they must appear
const LITERALS: &[(usize, &str, &str)] = &[
    (1, "subscriptions", "expected `subscriptions` at segment 1"),
    (3, "resourceGroups", "expected `resourceGroups` at segment 3"),
    (5, "providers", "expected `providers` at segment 5"),
];

/// Slash-joined chain of type segments, e.g. `virtualNetworks/subnets`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceTypePath(String);

impl ResourceTypePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The top-level type segment
    pub fn top_level(&self) -> &str {
        self.segments().next().unwrap_or_default()
    }

    /// Number of type levels (1 for top-level resources)
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// True when `candidate` is nested strictly below this type.
    ///
    /// Comparison is ASCII case-insensitive: ARM does not guarantee the casing
    /// of type names in ids matches the provider metadata.
    /// Declarations differing only in case each match, so each gets its own
    /// enumeration worker; aggregation removes the duplicate resources by id.
    pub fn is_parent_of(&self, candidate: &str) -> bool {
        let parent = self.0.as_str();
        if candidate.len() <= parent.len() + 1 {
            return false;
        }
        let Some(head) = candidate.get(..parent.len()) else {
            return false;
        };
        head.eq_ignore_ascii_case(parent) && candidate.as_bytes()[parent.len()] == b'/'
    }

    /// Case-insensitive equality against a provider-declared type
    pub fn matches(&self, declared: &str) -> bool {
        self.0.eq_ignore_ascii_case(declared)
    }
}

impl fmt::Display for ResourceTypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed ARM resource identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentifier {
    raw: String,
    subscription: String,
    resource_group: String,
    provider: String,
    type_path: ResourceTypePath,
    name: Option<String>,
}

impl ResourceIdentifier {
    /// Parse an identifier without touching the network
    pub fn parse(id: &str) -> Result<Self, ArmError> {
        let trimmed = id.strip_suffix('/').unwrap_or(id);
        let segments: Vec<&str> = trimmed.split('/').collect();

        if segments.len() < MIN_SEGMENTS {
            return Err(ArmError::malformed(id, "expected at least 8 path segments"));
        }
        if !segments[0].is_empty() {
            return Err(ArmError::malformed(id, "identifier must start with `/`"));
        }
        for (offset, literal, reason) in LITERALS {
            if !segments[*offset].eq_ignore_ascii_case(literal) {
                return Err(ArmError::malformed(id, *reason));
            }
        }

        let resource_group = segments[GROUP_OFFSET];
        let provider = segments[PROVIDER_OFFSET];
        if resource_group.is_empty() {
            return Err(ArmError::malformed(id, "empty resource group segment"));
        }
        if provider.is_empty() {
            return Err(ArmError::malformed(id, "empty provider segment"));
        }

        // Type segments alternate with names: type/name/subtype/subname/...
        let mut type_index = TYPE_OFFSET;
        let mut types = vec![segments[type_index]];
        while segments.len() > type_index + 2 {
            type_index += 2;
            types.push(segments[type_index]);
        }
        if types.iter().any(|t| t.is_empty()) {
            return Err(ArmError::malformed(id, "empty resource type segment"));
        }

        let name = segments
            .get(type_index + 1)
            .filter(|n| !n.is_empty())
            .map(|n| n.to_string());

        Ok(Self {
            raw: trimmed.to_string(),
            subscription: segments[SUBSCRIPTION_OFFSET].to_string(),
            resource_group: resource_group.to_string(),
            provider: provider.to_string(),
            type_path: ResourceTypePath::new(types.join("/")),
            name,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn subscription(&self) -> &str {
        &self.subscription
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    /// Provider namespace, e.g. `Microsoft.Network`
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn type_path(&self) -> &ResourceTypePath {
        &self.type_path
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Fully qualified type as ARM reports it, e.g. `Microsoft.Network/virtualNetworks`
    pub fn qualified_type(&self) -> String {
        format!("{}/{}", self.provider, self.type_path)
    }
}

impl FromStr for ResourceIdentifier {
    type Err = ArmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
