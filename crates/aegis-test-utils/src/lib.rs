//! Shared test utilities for aegis
//!
//! Helpers for the `#[ignore]`d integration tests that talk to a real AWS
//! account.
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection and unique resource naming

pub mod aws;

pub use aws::{get_test_region, test_bucket_name, test_resource_name, test_run_id};
