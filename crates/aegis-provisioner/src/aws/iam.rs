//! IAM role and instance profile management for the worker

use super::context::{AwsContext, FromAwsContext};
use super::error::{AwsError, sdk_error};
use aws_sdk_iam::Client;
use aws_sdk_iam::types::Tag;

/// IAM client for managing roles and instance profiles
pub struct IamClient {
    client: Client,
}

impl FromAwsContext for IamClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }
}

/// Trait for IAM operations that can be mocked in tests.
///
/// Each method is a single IAM call; sequencing and idempotence live in the
/// role service.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait IamOperations: Send + Sync {
    async fn create_role(
        &self,
        role_name: &str,
        trust_policy: &str,
        tags: Vec<(String, String)>,
    ) -> Result<(), AwsError>;

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), AwsError>;

    async fn create_instance_profile(
        &self,
        profile_name: &str,
        tags: Vec<(String, String)>,
    ) -> Result<(), AwsError>;

    async fn add_role_to_instance_profile(
        &self,
        profile_name: &str,
        role_name: &str,
    ) -> Result<(), AwsError>;

    async fn remove_role_from_instance_profile(
        &self,
        profile_name: &str,
        role_name: &str,
    ) -> Result<(), AwsError>;

    async fn delete_instance_profile(&self, profile_name: &str) -> Result<(), AwsError>;

    async fn delete_role_policy(&self, role_name: &str, policy_name: &str)
    -> Result<(), AwsError>;

    async fn delete_role(&self, role_name: &str) -> Result<(), AwsError>;
}

fn iam_tags(tags: Vec<(String, String)>) -> Result<Vec<Tag>, AwsError> {
    tags.into_iter()
        .map(|(key, value)| {
            Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(AwsError::invalid_request)
        })
        .collect()
}

impl IamOperations for IamClient {
    async fn create_role(
        &self,
        role_name: &str,
        trust_policy: &str,
        tags: Vec<(String, String)>,
    ) -> Result<(), AwsError> {
        self.client
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(trust_policy)
            .description("aegis worker role")
            .set_tags(Some(iam_tags(tags)?))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), AwsError> {
        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .policy_document(policy_document)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn create_instance_profile(
        &self,
        profile_name: &str,
        tags: Vec<(String, String)>,
    ) -> Result<(), AwsError> {
        self.client
            .create_instance_profile()
            .instance_profile_name(profile_name)
            .set_tags(Some(iam_tags(tags)?))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn add_role_to_instance_profile(
        &self,
        profile_name: &str,
        role_name: &str,
    ) -> Result<(), AwsError> {
        self.client
            .add_role_to_instance_profile()
            .instance_profile_name(profile_name)
            .role_name(role_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn remove_role_from_instance_profile(
        &self,
        profile_name: &str,
        role_name: &str,
    ) -> Result<(), AwsError> {
        self.client
            .remove_role_from_instance_profile()
            .instance_profile_name(profile_name)
            .role_name(role_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn delete_instance_profile(&self, profile_name: &str) -> Result<(), AwsError> {
        self.client
            .delete_instance_profile()
            .instance_profile_name(profile_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn delete_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<(), AwsError> {
        self.client
            .delete_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn delete_role(&self, role_name: &str) -> Result<(), AwsError> {
        self.client
            .delete_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
