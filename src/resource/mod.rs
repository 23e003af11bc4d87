//! Resource hierarchy layer
//!
//! Discovers subresources of an ARM resource when the API offers no
//! "children" endpoint, plus the plain group and resource listings.
//!
//! # Architecture
//!
//! - [`id`] - Parses resource ids into group, provider and type path
//! - [`provider`] - Provider metadata: declared types and their API versions
//! - [`matcher`] - Picks the declared types nested below a parent type
//! - [`fanout`] - One concurrent enumeration worker per candidate type
//! - [`discovery`] - The engine composing all of the above
//! - [`manager`] - The remote API seam the engine depends on
//!
//! # Example
//!
//! ```ignore
//! use armwalk::resource::{DiscoveryEngine, DiscoveryOptions};
//!
//! async fn subnets(engine: &DiscoveryEngine) -> Vec<armwalk::resource::Resource> {
//!     engine
//!         .discover_subresources(
//!             "/subscriptions/S/resourceGroups/RG/providers/Microsoft.Network/virtualNetworks/hub",
//!         )
//!         .await
//! }
//! ```

pub mod discovery;
pub mod fanout;
pub mod id;
pub mod manager;
pub mod matcher;
pub mod model;
pub mod pager;
pub mod provider;

#[cfg(test)]
pub(crate) mod testing;

pub use discovery::{DiscoveryEngine, DiscoveryOptions, DiscoveryResult, DiscoveryStage};
pub use fanout::{enumerate_children, Enumeration, EnumerationScope};
pub use id::{ResourceIdentifier, ResourceTypePath};
pub use manager::ResourceManager;
pub use matcher::{candidates_from, match_children};
pub use model::{Page, Resource, ResourceGroup};
pub use provider::{resolve_all_types, resolve_type_versions, ProviderMetadata};
