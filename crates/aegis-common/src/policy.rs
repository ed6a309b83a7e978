//! IAM policy documents for the worker role
//!
//! The trust policy is static. The permission policy grants the worker
//! exactly one action on each of the three data resources.

use serde::{Deserialize, Serialize};

/// IAM policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// The trust policy allowing EC2 to assume the role
pub const EC2_ASSUME_ROLE_POLICY: &str = r#"{
    "Version": "2012-10-17",
    "Statement": [
        {
            "Effect": "Allow",
            "Principal": {
                "Service": "ec2.amazonaws.com"
            },
            "Action": "sts:AssumeRole"
        }
    ]
}"#;

/// An IAM policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

/// A single policy statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub service: String,
}

impl Statement {
    fn allow(sid: &str, action: &str, resource: String) -> Self {
        Self {
            sid: Some(sid.to_string()),
            effect: Effect::Allow,
            principal: None,
            action: action.to_string(),
            resource: Some(resource),
        }
    }
}

impl PolicyDocument {
    /// Serialize to the JSON string IAM expects.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Build the inline permission policy for the worker role.
///
/// Grants `s3:PutObject` on every object in the bucket, `dynamodb:PutItem`
/// on the table and `kms:GenerateDataKey` on the key.
pub fn build_permission_policy(bucket_arn: &str, table_arn: &str, key_arn: &str) -> PolicyDocument {
    PolicyDocument {
        version: POLICY_VERSION.to_string(),
        statement: vec![
            Statement::allow(
                "AllowPutObjectToVaultBucket",
                "s3:PutObject",
                format!("{bucket_arn}/*"),
            ),
            Statement::allow(
                "AllowPutItemToMetadataTable",
                "dynamodb:PutItem",
                table_arn.to_string(),
            ),
            Statement::allow(
                "AllowGenerateDataKeyWithVaultKmsKey",
                "kms:GenerateDataKey",
                key_arn.to_string(),
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_policy_has_exactly_three_grants() {
        let policy = build_permission_policy("arn:b", "arn:t", "arn:k");
        assert_eq!(policy.version, POLICY_VERSION);

        let grants: Vec<_> = policy
            .statement
            .iter()
            .map(|s| (s.effect, s.action.as_str(), s.resource.as_deref()))
            .collect();
        assert_eq!(
            grants,
            vec![
                (Effect::Allow, "s3:PutObject", Some("arn:b/*")),
                (Effect::Allow, "dynamodb:PutItem", Some("arn:t")),
                (Effect::Allow, "kms:GenerateDataKey", Some("arn:k")),
            ]
        );
    }

    #[test]
    fn permission_policy_serializes_with_iam_field_names() {
        let json = build_permission_policy("arn:b", "arn:t", "arn:k")
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["Version"], "2012-10-17");
        assert_eq!(value["Statement"][0]["Effect"], "Allow");
        assert_eq!(value["Statement"][0]["Action"], "s3:PutObject");
        assert_eq!(value["Statement"][0]["Resource"], "arn:b/*");
        assert!(value["Statement"][0].get("Principal").is_none());
    }

    #[test]
    fn trust_policy_lets_ec2_assume_the_role() {
        let policy: PolicyDocument = serde_json::from_str(EC2_ASSUME_ROLE_POLICY).unwrap();
        assert_eq!(policy.statement.len(), 1);

        let statement = &policy.statement[0];
        assert_eq!(statement.effect, Effect::Allow);
        assert_eq!(statement.action, "sts:AssumeRole");
        assert_eq!(
            statement.principal.as_ref().map(|p| p.service.as_str()),
            Some("ec2.amazonaws.com")
        );
    }
}
