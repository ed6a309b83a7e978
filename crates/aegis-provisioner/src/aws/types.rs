//! SDK-independent views of the remote resources
//!
//! The `*Operations` traits speak these types so services and waiters can
//! run against fakes without constructing SDK output shapes.

/// KMS key lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyState {
    Creating,
    Enabled,
    Disabled,
    PendingDeletion,
    PendingImport,
    Unavailable,
    Other(String),
}

impl KeyState {
    pub fn parse(s: &str) -> Self {
        match s {
            "Creating" => KeyState::Creating,
            "Enabled" => KeyState::Enabled,
            "Disabled" => KeyState::Disabled,
            "PendingDeletion" => KeyState::PendingDeletion,
            "PendingImport" => KeyState::PendingImport,
            "Unavailable" => KeyState::Unavailable,
            other => KeyState::Other(other.to_string()),
        }
    }
}

/// Key identifiers plus state, as returned by DescribeKey/CreateKey
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMetadata {
    pub key_id: String,
    pub arn: String,
    pub state: KeyState,
}

/// DynamoDB table status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    Other(String),
}

impl TableStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "CREATING" => TableStatus::Creating,
            "ACTIVE" => TableStatus::Active,
            "UPDATING" => TableStatus::Updating,
            "DELETING" => TableStatus::Deleting,
            other => TableStatus::Other(other.to_string()),
        }
    }
}

/// Parameters of the audit table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    /// Single string hash key
    pub hash_key: String,
    /// DynamoDB billing mode (e.g., "PAY_PER_REQUEST")
    pub billing_mode: String,
    pub deletion_protection: bool,
    pub tags: Vec<(String, String)>,
}

/// EC2 instance state names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
}

impl InstanceState {
    /// States in which a worker still counts as provisioned.
    pub const LIVE: [InstanceState; 4] = [
        InstanceState::Pending,
        InstanceState::Running,
        InstanceState::Stopping,
        InstanceState::Stopped,
    ];

    /// The `instance-state-name` filter value
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InstanceState::Pending),
            "running" => Some(InstanceState::Running),
            "shutting-down" => Some(InstanceState::ShuttingDown),
            "terminated" => Some(InstanceState::Terminated),
            "stopping" => Some(InstanceState::Stopping),
            "stopped" => Some(InstanceState::Stopped),
            _ => None,
        }
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Described instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub instance_id: String,
    pub state: InstanceState,
    pub public_ip: Option<String>,
}

/// Configuration for launching the worker instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub ami_id: String,
    /// EC2 instance type (e.g., "t2.micro")
    pub instance_type: String,
    pub key_name: String,
    pub security_group_id: String,
    pub instance_profile: String,
    /// User data script (base64 encoded by the client)
    pub user_data: String,
    /// Tags applied to the instance, including the discovery tag
    pub tags: Vec<(String, String)>,
}

impl LaunchSpec {
    /// Create a launch spec with required fields and no tags
    pub fn new(
        ami_id: impl Into<String>,
        instance_type: impl Into<String>,
        key_name: impl Into<String>,
        security_group_id: impl Into<String>,
        instance_profile: impl Into<String>,
    ) -> Self {
        Self {
            ami_id: ami_id.into(),
            instance_type: instance_type.into(),
            key_name: key_name.into(),
            security_group_id: security_group_id.into(),
            instance_profile: instance_profile.into(),
            user_data: String::new(),
            tags: Vec::new(),
        }
    }

    /// Set the bootstrap script
    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = user_data.into();
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_state_filter_values_round_trip() {
        for state in [
            InstanceState::Pending,
            InstanceState::Running,
            InstanceState::ShuttingDown,
            InstanceState::Terminated,
            InstanceState::Stopping,
            InstanceState::Stopped,
        ] {
            assert_eq!(InstanceState::parse(state.as_str()), Some(state));
        }
        assert_eq!(InstanceState::parse("rebooting"), None);
    }

    #[test]
    fn live_states_exclude_terminal_ones() {
        assert!(!InstanceState::LIVE.contains(&InstanceState::Terminated));
        assert!(!InstanceState::LIVE.contains(&InstanceState::ShuttingDown));
        assert!(InstanceState::LIVE.contains(&InstanceState::Stopped));
    }

    #[test]
    fn unknown_key_and_table_states_are_preserved() {
        assert_eq!(KeyState::parse("Enabled"), KeyState::Enabled);
        assert_eq!(KeyState::parse("Weird"), KeyState::Other("Weird".into()));
        assert_eq!(TableStatus::parse("ACTIVE"), TableStatus::Active);
        assert_eq!(
            TableStatus::parse("ARCHIVED"),
            TableStatus::Other("ARCHIVED".into())
        );
    }
}
