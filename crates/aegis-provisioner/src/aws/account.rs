//! AWS account identity

use anyhow::{Context, Result};
use tracing::info;

use super::context::AwsContext;

/// Strongly-typed AWS account ID (12-digit string)
///
/// This newtype prevents accidentally mixing account IDs with other strings
/// when building ARNs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    /// Accept a configured account ID after checking its shape.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != 12 || !s.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("Invalid AWS account ID '{}': expected 12 digits", s);
        }
        Ok(AccountId(s.to_string()))
    }
}

/// Fetch the current AWS account ID from credentials via STS GetCallerIdentity
///
/// This operation requires no special permissions - it always succeeds if
/// credentials are valid.
pub async fn get_current_account_id(ctx: &AwsContext) -> Result<AccountId> {
    let identity = ctx
        .sts_client()
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "AWS account validated");

    Ok(AccountId(account.to_string()))
}

/// Use the configured account ID, or ask STS when none is configured.
pub async fn resolve_account_id(ctx: &AwsContext, configured: Option<&str>) -> Result<AccountId> {
    match configured {
        Some(id) => AccountId::parse(id),
        None => get_current_account_id(ctx).await,
    }
}
