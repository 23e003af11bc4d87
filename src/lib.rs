//! armwalk - browse Azure Resource Manager hierarchies
//!
//! Lists resource groups and resources, fetches resources by id, and discovers
//! the subresources nested under any resource by fanning out over the child
//! types its provider declares.

pub mod azure;
pub mod config;
pub mod error;
pub mod resource;

pub use error::ArmError;
