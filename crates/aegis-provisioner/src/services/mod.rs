//! One service per provisioned resource kind
//!
//! Each service borrows the client it needs, makes its create idempotent and
//! its delete best-effort. Sequencing across services belongs to the
//! orchestrator.

pub mod bucket;
pub mod compute;
pub mod key;
pub mod role;
pub mod table;

pub use bucket::BucketService;
pub use compute::{ComputeService, LaunchRequest, write_private_key};
pub use key::{KeyRef, KeyService};
pub use role::{GrantTargets, RoleNames, RoleService};
pub use table::TableService;
