//! Error Types
//!
//! Failure taxonomy shared by the ARM client and the discovery engine.

use thiserror::Error;

/// Errors produced while browsing or discovering ARM resources
#[derive(Debug, Error)]
pub enum ArmError {
    /// The identifier could not be split into the expected ARM path shape
    #[error("malformed resource identifier `{id}`: {reason}")]
    MalformedIdentifier { id: String, reason: &'static str },

    /// The provider does not declare the requested type
    #[error("no resource type {type_path} found for provider {provider}")]
    UnknownResourceType { provider: String, type_path: String },

    /// The provider declares the type but lists no API versions for it
    #[error("no api versions found for resource type {provider}/{type_path}")]
    NoApiVersion { provider: String, type_path: String },

    /// The type has no declared children (a leaf resource)
    #[error("resource type {provider}/{type_path} declares no subresource types")]
    NoSubresourceTypes { provider: String, type_path: String },

    /// A candidate's enumeration failed before yielding anything
    #[error("failed to enumerate {candidate}: {cause:#}")]
    EnumerationFailure {
        candidate: String,
        cause: anyhow::Error,
    },

    /// A page fetch failed mid-stream; earlier pages were kept
    #[error("page fetch failed after {fetched} items: {cause:#}")]
    PageFetchFailure { fetched: usize, cause: anyhow::Error },

    /// GET by id returned 404
    #[error("resource {id} not found")]
    NotFound { id: String },

    /// Non-success response from the management API
    #[error("API request failed: {status}{}", describe_api_error(.code, .message))]
    Api {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

impl ArmError {
    pub(crate) fn malformed(id: &str, reason: &'static str) -> Self {
        ArmError::MalformedIdentifier {
            id: id.to_string(),
            reason,
        }
    }

    /// HTTP status of an API failure, looking through `Remote` wrappers
    pub fn status(&self) -> Option<u16> {
        match self {
            ArmError::Api { status, .. } => Some(*status),
            ArmError::NotFound { .. } => Some(404),
            ArmError::Remote(err) => status_of(err),
            _ => None,
        }
    }
}

/// HTTP status carried by an `anyhow` error wrapping an [`ArmError`]
pub fn status_of(err: &anyhow::Error) -> Option<u16> {
    err.downcast_ref::<ArmError>().and_then(ArmError::status)
}

fn describe_api_error(code: &Option<String>, message: &Option<String>) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!(" ({code}: {message})"),
        (Some(code), None) => format!(" ({code})"),
        (None, Some(message)) => format!(" ({message})"),
        (None, None) => String::new(),
    }
}
