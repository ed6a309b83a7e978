//! Default configuration values for the aegis topology
//!
//! Every provisioned resource has a fixed name. The binary exposes each of
//! these as a flag with an environment override, so a bare invocation uses
//! exactly the values below.

/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-1";

/// S3 bucket holding vault objects
pub const DEFAULT_BUCKET_NAME: &str = "boto3-bucket6478324";

/// DynamoDB table recording audit metadata
pub const DEFAULT_TABLE_NAME: &str = "Aegis_Audit_Log";

/// Hash key attribute of the audit table
pub const TABLE_HASH_KEY: &str = "file_id";

/// DynamoDB billing mode for the audit table
pub const DEFAULT_BILLING_MODE: &str = "PAY_PER_REQUEST";

/// IAM role assumed by the worker instance
pub const DEFAULT_ROLE_NAME: &str = "Aegis_Role_v1";

/// IAM instance profile wrapping the role
pub const DEFAULT_INSTANCE_PROFILE_NAME: &str = "Aegis_Worker_Profile";

/// Name of the inline permission policy attached to the role
pub const DEFAULT_POLICY_NAME: &str = "AegisInlinePolicy";

/// KMS alias bound to the master key
pub const DEFAULT_KEY_ALIAS: &str = "alias/aegis-master-key";

/// Description set on a freshly created master key
pub const KEY_DESCRIPTION: &str = "Aegis Master Symmetric Key";

/// Days before a scheduled key deletion takes effect
pub const KEY_PENDING_WINDOW_DAYS: i32 = 7;

/// EC2 key pair name (the private key lands in `<name>.pem`)
pub const DEFAULT_KEY_PAIR_NAME: &str = "Aegis_Key";

/// EC2 security group name
pub const DEFAULT_SECURITY_GROUP_NAME: &str = "Aegis_SG";

/// CIDR allowed to reach the instance over SSH
pub const DEFAULT_SSH_CIDR: &str = "192.168.1.107/32";

/// SSM public parameter resolving to the latest AL2023 AMI
pub const DEFAULT_AMI_PARAMETER: &str =
    "/aws/service/ami-amazon-linux-latest/al2023-ami-kernel-default-x86_64";

/// Worker instance type
pub const DEFAULT_INSTANCE_TYPE: &str = "t2.micro";

/// Pause after creating a role so IAM can propagate it (seconds)
pub const IAM_PROPAGATION_DELAY_SECS: u64 = 2;

/// Instance running/terminated wait: total timeout (seconds)
pub const INSTANCE_WAIT_TIMEOUT_SECS: u64 = 600;

/// Instance running/terminated wait: attempt ceiling
pub const INSTANCE_WAIT_MAX_ATTEMPTS: u32 = 40;

/// Table active wait: total timeout (seconds)
pub const TABLE_WAIT_TIMEOUT_SECS: u64 = 300;

/// Table active wait: attempt ceiling
pub const TABLE_WAIT_MAX_ATTEMPTS: u32 = 25;

/// Key enabled wait: total timeout (seconds)
pub const KEY_WAIT_TIMEOUT_SECS: u64 = 120;

/// Key enabled wait: attempt ceiling
pub const KEY_WAIT_MAX_ATTEMPTS: u32 = 30;

/// Bootstrap script run by the worker on first boot
pub const WORKER_USER_DATA: &str = r#"#!/bin/bash
dnf update -y
dnf install python3-pip -y
pip3 install boto3
echo "Aegis Setup Complete" > /home/ec2-user/setup_log.txt
"#;
