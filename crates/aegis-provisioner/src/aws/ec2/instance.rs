//! EC2 instance lifecycle operations

use super::{Ec2Client, tag_spec};
use crate::aws::error::{AwsError, sdk_error};
use crate::aws::types::{InstanceInfo, InstanceState, LaunchSpec};
use aws_sdk_ec2::types::{
    Filter, IamInstanceProfileSpecification, Instance, InstanceType, ResourceType,
};
use tracing::{debug, info};

fn to_info(instance: &Instance) -> Option<InstanceInfo> {
    let instance_id = instance.instance_id()?.to_string();
    let state = instance
        .state()
        .and_then(|s| s.name())
        .and_then(|n| InstanceState::parse(n.as_str()))?;
    Some(InstanceInfo {
        instance_id,
        state,
        public_ip: instance.public_ip_address().map(str::to_string),
    })
}

impl Ec2Client {
    /// Find instances by tag, paginating through every reservation
    pub async fn describe_instances_by_tag(
        &self,
        tag_key: &str,
        tag_value: &str,
        states: &[InstanceState],
    ) -> Result<Vec<InstanceInfo>, AwsError> {
        let mut filters = vec![
            Filter::builder()
                .name(format!("tag:{tag_key}"))
                .values(tag_value)
                .build(),
        ];
        if !states.is_empty() {
            filters.push(
                Filter::builder()
                    .name("instance-state-name")
                    .set_values(Some(states.iter().map(|s| s.as_str().to_string()).collect()))
                    .build(),
            );
        }

        let mut found = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let response = self
                .client
                .describe_instances()
                .set_filters(Some(filters.clone()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(sdk_error)?;

            found.extend(
                response
                    .reservations()
                    .iter()
                    .flat_map(|r| r.instances())
                    .filter_map(to_info),
            );

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(tag_key, tag_value, count = found.len(), "Described instances by tag");
        Ok(found)
    }

    /// Describe instances by id
    pub async fn describe_instances(&self, ids: Vec<String>) -> Result<Vec<InstanceInfo>, AwsError> {
        let response = self
            .client
            .describe_instances()
            .set_instance_ids(Some(ids))
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(response
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .filter_map(to_info)
            .collect())
    }

    /// Issue a single RunInstances call for one instance
    pub async fn run_instance(&self, spec: &LaunchSpec) -> Result<String, AwsError> {
        let user_data_b64 = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            spec.user_data.as_bytes(),
        );

        let response = self
            .client
            .run_instances()
            .image_id(&spec.ami_id)
            .instance_type(InstanceType::from(spec.instance_type.as_str()))
            .min_count(1)
            .max_count(1)
            .key_name(&spec.key_name)
            .security_group_ids(&spec.security_group_id)
            .iam_instance_profile(
                IamInstanceProfileSpecification::builder()
                    .name(&spec.instance_profile)
                    .build(),
            )
            .user_data(user_data_b64)
            .tag_specifications(tag_spec(ResourceType::Instance, &spec.tags))
            .send()
            .await
            .map_err(sdk_error)?;

        let instance_id = response
            .instances()
            .first()
            .and_then(|i| i.instance_id())
            .ok_or_else(|| AwsError::missing_field("instance id"))?
            .to_string();

        info!(instance_id = %instance_id, ami = %spec.ami_id, "Instance launched");
        Ok(instance_id)
    }

    /// Start stopped instances
    pub async fn start_instances(&self, ids: Vec<String>) -> Result<(), AwsError> {
        self.client
            .start_instances()
            .set_instance_ids(Some(ids))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    /// Terminate instances
    pub async fn terminate_instances(&self, ids: Vec<String>) -> Result<(), AwsError> {
        self.client
            .terminate_instances()
            .set_instance_ids(Some(ids))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
