//! Azure Resource Manager interaction module
//!
//! This module provides the concrete ARM backend for the discovery engine:
//! authentication, HTTP transport, and the REST client.
//!
//! # Module Structure
//!
//! - [`auth`] - Bearer tokens from the Azure CLI, default subscription lookup
//! - [`client`] - ARM client implementing [`crate::resource::ResourceManager`]
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use armwalk::azure::client::{ArmClient, DEFAULT_ENDPOINT};
//! use armwalk::resource::ResourceManager;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = ArmClient::new("00000000-0000-0000-0000-000000000000", DEFAULT_ENDPOINT)?;
//!     let groups = client.resource_groups_page(None).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
