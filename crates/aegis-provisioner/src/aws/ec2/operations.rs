//! EC2 operations trait for testing

use super::Ec2Client;
use crate::aws::error::AwsError;
use crate::aws::types::{InstanceInfo, InstanceState, LaunchSpec};

/// Trait for EC2 operations that can be mocked in tests.
///
/// This trait abstracts the EC2 client operations to enable unit testing
/// of the compute service without hitting real AWS.
///
/// Note: Collection parameters are owned `Vec`s instead of slices to work
/// around mockall lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait Ec2Operations: Send + Sync {
    /// Find instances carrying `tag_key = tag_value`, optionally limited to
    /// `states` (an empty list means any state)
    async fn describe_instances_by_tag(
        &self,
        tag_key: &str,
        tag_value: &str,
        states: Vec<InstanceState>,
    ) -> Result<Vec<InstanceInfo>, AwsError>;

    /// Describe specific instances
    async fn describe_instances(&self, ids: Vec<String>) -> Result<Vec<InstanceInfo>, AwsError>;

    /// Launch one instance, returning its id
    async fn run_instance(&self, spec: &LaunchSpec) -> Result<String, AwsError>;

    /// Start stopped instances
    async fn start_instances(&self, ids: Vec<String>) -> Result<(), AwsError>;

    /// Terminate instances
    async fn terminate_instances(&self, ids: Vec<String>) -> Result<(), AwsError>;

    /// Create a key pair, returning the PEM private key
    async fn create_key_pair(
        &self,
        key_name: &str,
        tags: Vec<(String, String)>,
    ) -> Result<String, AwsError>;

    /// Delete a key pair
    async fn delete_key_pair(&self, key_name: &str) -> Result<(), AwsError>;

    /// Ids of security groups with the given name
    async fn find_security_groups(&self, group_name: &str) -> Result<Vec<String>, AwsError>;

    /// Create a security group in the default VPC, returning its id
    async fn create_security_group(
        &self,
        group_name: &str,
        description: &str,
        tags: Vec<(String, String)>,
    ) -> Result<String, AwsError>;

    /// Allow inbound TCP on `port` from `cidr`
    async fn authorize_ingress(
        &self,
        security_group_id: &str,
        cidr: &str,
        port: i32,
    ) -> Result<(), AwsError>;

    /// Delete a security group
    async fn delete_security_group(&self, security_group_id: &str) -> Result<(), AwsError>;
}

impl Ec2Operations for Ec2Client {
    async fn describe_instances_by_tag(
        &self,
        tag_key: &str,
        tag_value: &str,
        states: Vec<InstanceState>,
    ) -> Result<Vec<InstanceInfo>, AwsError> {
        Ec2Client::describe_instances_by_tag(self, tag_key, tag_value, &states).await
    }

    async fn describe_instances(&self, ids: Vec<String>) -> Result<Vec<InstanceInfo>, AwsError> {
        Ec2Client::describe_instances(self, ids).await
    }

    async fn run_instance(&self, spec: &LaunchSpec) -> Result<String, AwsError> {
        Ec2Client::run_instance(self, spec).await
    }

    async fn start_instances(&self, ids: Vec<String>) -> Result<(), AwsError> {
        Ec2Client::start_instances(self, ids).await
    }

    async fn terminate_instances(&self, ids: Vec<String>) -> Result<(), AwsError> {
        Ec2Client::terminate_instances(self, ids).await
    }

    async fn create_key_pair(
        &self,
        key_name: &str,
        tags: Vec<(String, String)>,
    ) -> Result<String, AwsError> {
        Ec2Client::create_key_pair(self, key_name, &tags).await
    }

    async fn delete_key_pair(&self, key_name: &str) -> Result<(), AwsError> {
        Ec2Client::delete_key_pair(self, key_name).await
    }

    async fn find_security_groups(&self, group_name: &str) -> Result<Vec<String>, AwsError> {
        Ec2Client::find_security_groups(self, group_name).await
    }

    async fn create_security_group(
        &self,
        group_name: &str,
        description: &str,
        tags: Vec<(String, String)>,
    ) -> Result<String, AwsError> {
        Ec2Client::create_security_group(self, group_name, description, &tags).await
    }

    async fn authorize_ingress(
        &self,
        security_group_id: &str,
        cidr: &str,
        port: i32,
    ) -> Result<(), AwsError> {
        Ec2Client::authorize_ingress(self, security_group_id, cidr, port).await
    }

    async fn delete_security_group(&self, security_group_id: &str) -> Result<(), AwsError> {
        Ec2Client::delete_security_group(self, security_group_id).await
    }
}
