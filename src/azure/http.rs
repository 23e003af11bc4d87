//! HTTP utilities for ARM REST API calls

use crate::error::ArmError;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Upper bound on a single request so a stalled connection cannot hang a worker
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header ARM echoes back in its logs for request correlation
const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
fn sanitize_for_log(body: &str) -> String {
    let char_count = body.chars().count();
    let truncated = if char_count > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// ARM error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

fn api_error(status: u16, body: &str) -> ArmError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error);

    ArmError::Api {
        status,
        code: detail.as_ref().and_then(|d| d.code.clone()),
        message: detail.and_then(|d| d.message),
    }
}

/// HTTP client wrapper for ARM API calls
#[derive(Clone)]
pub struct ArmHttpClient {
    client: Client,
}

impl ArmHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("armwalk/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to an ARM API
    pub async fn get(&self, url: &Url, token: &str) -> Result<Value> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("GET {} [{}]", url, request_id);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID, request_id.as_str())
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                "API error: {} [{}] - {}",
                status,
                request_id,
                sanitize_for_log(&body)
            );
            return Err(api_error(status.as_u16(), &body).into());
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format an ARM error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_arm_error(error: &ArmError) -> String {
    match error.status() {
        Some(401) => {
            return "Authentication failed. Run 'az login'.".to_string();
        }
        Some(403) => {
            return "Permission denied. Check your Azure role assignments.".to_string();
        }
        Some(404) => return "Resource not found.".to_string(),
        Some(409) => {
            return "Resource conflict. The resource may be in a transitional state.".to_string();
        }
        Some(429) => return "Rate limit exceeded. Please try again later.".to_string(),
        Some(400) => return "Invalid request. Check your parameters.".to_string(),
        Some(500..=599) => {
            return "Azure Resource Manager temporarily unavailable. Please try again.".to_string();
        }
        _ => {}
    }

    // Identifier and metadata errors only echo user input and public type names
    let error_str = match error {
        ArmError::Remote(err) => format!("{:#}", err),
        other => other.to_string(),
    };

    if error_str.contains("API request failed") {
        return "Request failed. Check your network connection and try again.".to_string();
    }

    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let body = "é".repeat(300);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("[truncated, 600 bytes total]"));
    }

    #[test]
    fn test_api_error_reads_arm_envelope() {
        let err = api_error(
            403,
            r#"{"error":{"code":"AuthorizationFailed","message":"no access"}}"#,
        );
        match err {
            ArmError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 403);
                assert_eq!(code.as_deref(), Some("AuthorizationFailed"));
                assert_eq!(message.as_deref(), Some("no access"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_tolerates_non_json_body() {
        let err = api_error(502, "<html>Bad Gateway</html>");
        assert!(matches!(
            err,
            ArmError::Api {
                status: 502,
                code: None,
                message: None
            }
        ));
    }

    #[test]
    fn test_format_arm_error_by_status() {
        let unauthorized = ArmError::Api {
            status: 401,
            code: None,
            message: None,
        };
        assert!(format_arm_error(&unauthorized).contains("az login"));

        let wrapped = ArmError::Remote(
            anyhow::Error::new(ArmError::Api {
                status: 503,
                code: None,
                message: None,
            })
            .context("Failed to list resource groups"),
        );
        assert!(format_arm_error(&wrapped).contains("temporarily unavailable"));
    }

    #[test]
    fn test_format_arm_error_keeps_identifier_message() {
        let err = ArmError::MalformedIdentifier {
            id: "/subscriptions/S".to_string(),
            reason: "expected at least 8 path segments",
        };
        assert!(format_arm_error(&err).contains("expected at least 8 path segments"));
    }
}
