//! Security group management

use super::{Ec2Client, tag_spec};
use crate::aws::error::{AwsError, sdk_error};
use aws_sdk_ec2::types::{Filter, IpPermission, IpRange, ResourceType};
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::{debug, info, warn};

impl Ec2Client {
    /// Ids of every security group named `group_name`
    pub async fn find_security_groups(&self, group_name: &str) -> Result<Vec<String>, AwsError> {
        let response = self
            .client
            .describe_security_groups()
            .filters(Filter::builder().name("group-name").values(group_name).build())
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(response
            .security_groups()
            .iter()
            .filter_map(|g| g.group_id())
            .map(str::to_string)
            .collect())
    }

    async fn default_vpc_id(&self) -> Result<String, AwsError> {
        let vpcs = self
            .client
            .describe_vpcs()
            .filters(Filter::builder().name("isDefault").values("true").build())
            .send()
            .await
            .map_err(sdk_error)?;

        vpcs.vpcs()
            .first()
            .and_then(|v| v.vpc_id())
            .map(str::to_string)
            .ok_or_else(|| AwsError::missing_field("default VPC"))
    }

    /// Create a security group in the default VPC
    ///
    /// # Returns
    /// The security group ID
    pub async fn create_security_group(
        &self,
        group_name: &str,
        description: &str,
        tags: &[(String, String)],
    ) -> Result<String, AwsError> {
        let vpc_id = self.default_vpc_id().await?;
        info!(name = %group_name, vpc_id = %vpc_id, "Creating security group");

        let response = self
            .client
            .create_security_group()
            .group_name(group_name)
            .description(description)
            .vpc_id(&vpc_id)
            .tag_specifications(tag_spec(ResourceType::SecurityGroup, tags))
            .send()
            .await
            .map_err(sdk_error)?;

        response
            .group_id()
            .map(str::to_string)
            .ok_or_else(|| AwsError::missing_field("security group id"))
    }

    /// Allow inbound TCP on a single port from `cidr`
    pub async fn authorize_ingress(
        &self,
        security_group_id: &str,
        cidr: &str,
        port: i32,
    ) -> Result<(), AwsError> {
        let permission = IpPermission::builder()
            .ip_protocol("tcp")
            .from_port(port)
            .to_port(port)
            .ip_ranges(
                IpRange::builder()
                    .cidr_ip(cidr)
                    .description("aegis operator access")
                    .build(),
            )
            .build();

        self.client
            .authorize_security_group_ingress()
            .group_id(security_group_id)
            .ip_permissions(permission)
            .send()
            .await
            .map_err(sdk_error)?;

        info!(sg_id = %security_group_id, cidr, port, "Ingress rule added");
        Ok(())
    }

    /// Delete a security group
    ///
    /// Retries on DependencyViolation errors (network interfaces of a just
    /// terminated instance can take a while to release).
    pub async fn delete_security_group(&self, security_group_id: &str) -> Result<(), AwsError> {
        info!(sg_id = %security_group_id, "Deleting security group");

        (|| async {
            self.client
                .delete_security_group()
                .group_id(security_group_id)
                .send()
                .await
                .map_err(sdk_error)?;
            debug!(sg_id = %security_group_id, "Security group deleted");
            Ok(())
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(10))
                .with_max_delay(Duration::from_secs(60))
                .with_max_times(5),
        )
        .when(|e: &AwsError| matches!(e, AwsError::DependencyViolation { .. }))
        .notify(|e, dur| {
            warn!(
                sg_id = %security_group_id,
                delay = ?dur,
                error = %e,
                "Security group still in use, retrying..."
            );
        })
        .await
    }
}
