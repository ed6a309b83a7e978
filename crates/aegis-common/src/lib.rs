//! aegis-common - Shared types and utilities
//!
//! This crate holds the SDK-free pieces of the aegis provisioner so they can
//! be tested without AWS.
//!
//! ## Modules
//!
//! - [`arn`]: ARN construction for the provisioned resources
//! - [`defaults`]: Named configuration constants for the fixed topology
//! - [`policy`]: IAM trust and permission policy documents
//! - [`resource_kind`]: Resource kinds and teardown ordering
//! - [`tags`]: AWS resource tag constants for discovery

pub mod arn;
pub mod defaults;
pub mod policy;
pub mod resource_kind;
pub mod tags;

// Re-export commonly used types
pub use policy::{EC2_ASSUME_ROLE_POLICY, PolicyDocument, Statement, build_permission_policy};
pub use resource_kind::ResourceKind;
