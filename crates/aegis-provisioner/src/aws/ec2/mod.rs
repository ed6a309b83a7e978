//! EC2 instance, security group and key pair management

mod instance;
mod key_pair;
mod operations;
mod security_group;

pub use operations::Ec2Operations;

#[cfg(test)]
pub use operations::MockEc2Operations;

use crate::aws::context::{AwsContext, FromAwsContext};
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{ResourceType, Tag, TagSpecification};

/// EC2 client for the worker instance and its network/key resources
pub struct Ec2Client {
    pub(crate) client: Client,
}

impl FromAwsContext for Ec2Client {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }
}

/// Build an EC2 TagSpecification from key/value pairs.
pub(crate) fn tag_spec(resource_type: ResourceType, tags: &[(String, String)]) -> TagSpecification {
    let mut builder = TagSpecification::builder().resource_type(resource_type);
    for (k, v) in tags {
        builder = builder.tags(Tag::builder().key(k).value(v).build());
    }
    builder.build()
}
