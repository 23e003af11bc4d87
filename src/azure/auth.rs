//! Azure Authentication
//!
//! Builds the credential used for ARM bearer tokens and reads the default
//! subscription from the Azure CLI profile.

use anyhow::{Context, Result};
use azure_core::credentials::{TokenCredential, TokenRequestOptions};
use azure_identity::AzureCliCredential;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Credential backed by the Azure CLI login (`az login`)
pub fn create_credential() -> Result<Arc<dyn TokenCredential>> {
    tracing::debug!("Using Azure CLI credential");
    let credential: Arc<dyn TokenCredential> =
        AzureCliCredential::new(None).context("Failed to create AzureCliCredential")?;
    Ok(credential)
}

/// Token scope for an ARM endpoint, e.g. `https://management.azure.com/.default`
pub fn token_scope(endpoint: &str) -> String {
    format!("{}/.default", endpoint.trim_end_matches('/'))
}

/// Get an access token for `scope`
pub async fn get_token(credential: &Arc<dyn TokenCredential>, scope: &str) -> Result<String> {
    let options = Some(TokenRequestOptions::default());
    let token_response = credential
        .get_token(&[scope], options)
        .await
        .context("Failed to get ARM access token. Run 'az login'")?;
    Ok(token_response.token.secret().to_string())
}

/// Get the Azure CLI configuration directory
pub fn get_azure_config_dir() -> Option<PathBuf> {
    // Check AZURE_CONFIG_DIR environment variable first
    if let Ok(path) = std::env::var("AZURE_CONFIG_DIR") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|p| p.join(".azure"))
}

/// Validate a subscription id: a hyphenated GUID
pub fn validate_subscription_id(id: &str) -> bool {
    id.len() == 36 && uuid::Uuid::parse_str(id).is_ok()
}

#[derive(Deserialize)]
struct AzureProfile {
    #[serde(default)]
    subscriptions: Vec<ProfileSubscription>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSubscription {
    id: String,
    #[serde(default)]
    is_default: bool,
}

/// Default subscription recorded in an `azureProfile.json` document
fn default_subscription_from_profile(content: &str) -> Option<String> {
    // The CLI writes this file with a UTF-8 BOM
    let content = content.trim_start_matches('\u{feff}');
    let profile: AzureProfile = serde_json::from_str(content).ok()?;

    profile
        .subscriptions
        .into_iter()
        .find(|s| s.is_default)
        .map(|s| s.id)
        .filter(|id| validate_subscription_id(id))
}

/// Read the default subscription from the environment or the Azure CLI profile
/// Security: Validates subscription id format before returning
pub fn get_default_subscription() -> Option<String> {
    if let Ok(subscription) = std::env::var("AZURE_SUBSCRIPTION_ID") {
        if validate_subscription_id(&subscription) {
            return Some(subscription);
        }
        tracing::warn!("Invalid subscription id format in AZURE_SUBSCRIPTION_ID");
    }

    let profile_path = get_azure_config_dir()?.join("azureProfile.json");
    let content = std::fs::read_to_string(&profile_path).ok()?;
    default_subscription_from_profile(&content)
}

/// Mock TokenCredential for unit tests
/// Returns a fixed token and records the requested scopes
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MockTokenCredential {
    pub(crate) scopes: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
#[async_trait::async_trait]
impl TokenCredential for MockTokenCredential {
    async fn get_token(
        &self,
        scopes: &[&str],
        _options: Option<TokenRequestOptions>,
    ) -> azure_core::Result<azure_core::credentials::AccessToken> {
        use azure_core::credentials::{AccessToken, Secret};
        use azure_core::time::{Duration, OffsetDateTime};

        self.scopes
            .lock()
            .unwrap()
            .extend(scopes.iter().map(|s| s.to_string()));

        Ok(AccessToken::new(
            Secret::new("test-token".to_string()),
            OffsetDateTime::now_utc() + Duration::seconds(3600),
        ))
    }
}
