//! SSM parameter lookup (AMI resolution)

use super::context::{AwsContext, FromAwsContext};
use super::error::{AwsError, sdk_error};
use aws_sdk_ssm::Client;

/// SSM client for reading public parameters
pub struct SsmClient {
    client: Client,
}

impl FromAwsContext for SsmClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ssm_client(),
        }
    }
}

/// Trait for SSM operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait SsmOperations: Send + Sync {
    /// Read a plain-text parameter value
    async fn get_parameter(&self, name: &str) -> Result<String, AwsError>;
}

impl SsmOperations for SsmClient {
    async fn get_parameter(&self, name: &str) -> Result<String, AwsError> {
        let response = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(false)
            .send()
            .await
            .map_err(sdk_error)?;

        response
            .parameter()
            .and_then(|p| p.value())
            .map(str::to_string)
            .ok_or_else(|| AwsError::missing_field("parameter value"))
    }
}
