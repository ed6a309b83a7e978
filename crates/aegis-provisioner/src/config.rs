//! Configuration types for the provisioner

use aegis_common::defaults::{
    DEFAULT_AMI_PARAMETER, DEFAULT_BILLING_MODE, DEFAULT_BUCKET_NAME,
    DEFAULT_INSTANCE_PROFILE_NAME, DEFAULT_INSTANCE_TYPE, DEFAULT_KEY_ALIAS,
    DEFAULT_KEY_PAIR_NAME, DEFAULT_POLICY_NAME, DEFAULT_REGION, DEFAULT_ROLE_NAME,
    DEFAULT_SECURITY_GROUP_NAME, DEFAULT_SSH_CIDR, DEFAULT_TABLE_NAME, WORKER_USER_DATA,
};
use std::path::PathBuf;

/// AWS session configuration
#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// AWS region
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
    /// Account ID used in ARNs (looked up via STS when absent)
    pub account_id: Option<String>,
}

/// Key, bucket and table names
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub key_alias: String,
    pub bucket: String,
    pub table: String,
    /// DynamoDB billing mode
    pub billing_mode: String,
}

/// Worker identity: role, instance profile and inline policy
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub role: String,
    pub instance_profile: String,
    pub policy_name: String,
}

/// Worker instance and its access resources
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    pub key_pair: String,
    pub security_group: String,
    /// CIDR allowed to SSH into the worker
    pub ssh_cidr: String,
    /// SSM parameter resolving to the AMI id
    pub ami_parameter: String,
    pub instance_type: String,
    /// Directory receiving `<key_pair>.pem`
    pub key_dir: PathBuf,
    /// Bootstrap script
    pub user_data: String,
}

/// Full infrastructure configuration, built once at start
#[derive(Debug, Clone)]
pub struct InfraConfig {
    pub aws: AwsConfig,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    pub compute: ComputeConfig,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            aws: AwsConfig {
                region: DEFAULT_REGION.to_string(),
                aws_profile: None,
                account_id: None,
            },
            storage: StorageConfig {
                key_alias: DEFAULT_KEY_ALIAS.to_string(),
                bucket: DEFAULT_BUCKET_NAME.to_string(),
                table: DEFAULT_TABLE_NAME.to_string(),
                billing_mode: DEFAULT_BILLING_MODE.to_string(),
            },
            identity: IdentityConfig {
                role: DEFAULT_ROLE_NAME.to_string(),
                instance_profile: DEFAULT_INSTANCE_PROFILE_NAME.to_string(),
                policy_name: DEFAULT_POLICY_NAME.to_string(),
            },
            compute: ComputeConfig {
                key_pair: DEFAULT_KEY_PAIR_NAME.to_string(),
                security_group: DEFAULT_SECURITY_GROUP_NAME.to_string(),
                ssh_cidr: DEFAULT_SSH_CIDR.to_string(),
                ami_parameter: DEFAULT_AMI_PARAMETER.to_string(),
                instance_type: DEFAULT_INSTANCE_TYPE.to_string(),
                key_dir: PathBuf::from("."),
                user_data: WORKER_USER_DATA.to_string(),
            },
        }
    }
}

impl InfraConfig {
    pub fn region(&self) -> &str {
        &self.aws.region
    }

    pub fn aws_profile(&self) -> Option<&str> {
        self.aws.aws_profile.as_deref()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.aws.account_id.as_deref()
    }

    /// Where the key pair's private key is written
    pub fn key_file(&self) -> PathBuf {
        self.compute
            .key_dir
            .join(format!("{}.pem", self.compute.key_pair))
    }
}
