//! AWS resource tag constants for aegis
//!
//! The worker instance has no stored id: it is found again on every run by
//! its `Name` tag. Every other taggable resource carries the tool tags so
//! it can be recognised in the console.
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `Name` | Discovery tag for the worker instance (`Aegis-Worker`) |
//! | `aegis:tool` | Static identifier ("aegis") |
//! | `aegis:created-at` | RFC 3339 creation timestamp |
//! | `environment` | Deployment environment |

/// Tag key used to discover the worker instance
pub const TAG_NAME: &str = "Name";

/// Tag value identifying the worker instance
pub const WORKER_TAG_VALUE: &str = "Aegis-Worker";

/// Tag key for tool identification - all aegis resources have this
pub const TAG_TOOL: &str = "aegis:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "aegis";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "aegis:created-at";

/// Tag key for the deployment environment
pub const TAG_ENVIRONMENT: &str = "environment";

/// Environment value stamped on every resource
pub const ENVIRONMENT_VALUE: &str = "test";

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}

/// Standard tag pairs for a resource created now.
pub fn standard_tags() -> Vec<(String, String)> {
    vec![
        (TAG_TOOL.to_string(), TAG_TOOL_VALUE.to_string()),
        (
            TAG_CREATED_AT.to_string(),
            format_created_at(chrono::Utc::now()),
        ),
        (TAG_ENVIRONMENT.to_string(), ENVIRONMENT_VALUE.to_string()),
    ]
}

/// Standard tags plus the worker discovery tag.
pub fn worker_tags() -> Vec<(String, String)> {
    let mut tags = vec![(TAG_NAME.to_string(), WORKER_TAG_VALUE.to_string())];
    tags.extend(standard_tags());
    tags
}
