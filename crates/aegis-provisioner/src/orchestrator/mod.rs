//! Provision and cleanup orchestration
//!
//! The orchestrator owns nothing but borrowed clients and configuration. It
//! runs the resource services one after another in dependency order.

pub mod cleanup;
pub mod provision;

pub use provision::{ProvisionError, ProvisionStep, ProvisionedInfrastructure};

use crate::aws::{AccountId, CloudClients};
use crate::config::InfraConfig;
use crate::services::{RoleNames, RoleService};
use crate::wait::WaitPolicies;
use aegis_common::defaults::IAM_PROPAGATION_DELAY_SECS;
use std::time::Duration;

/// Sequences the resource services against one client set
pub struct Orchestrator<'a, C> {
    clients: &'a C,
    config: &'a InfraConfig,
    /// Only provisioning needs it, for the table ARN
    account_id: Option<AccountId>,
    wait: WaitPolicies,
    propagation_delay: Duration,
}

impl<'a, C: CloudClients> Orchestrator<'a, C> {
    pub fn new(clients: &'a C, config: &'a InfraConfig) -> Self {
        Self {
            clients,
            config,
            account_id: None,
            wait: WaitPolicies::default(),
            propagation_delay: Duration::from_secs(IAM_PROPAGATION_DELAY_SECS),
        }
    }

    /// Account the provisioned ARNs belong to
    pub fn with_account_id(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Override wait and retry timing
    pub fn with_wait_policies(mut self, wait: WaitPolicies) -> Self {
        self.wait = wait;
        self
    }

    /// Override the pause after creating the role
    pub fn with_propagation_delay(mut self, delay: Duration) -> Self {
        self.propagation_delay = delay;
        self
    }

    fn role_names(&self) -> RoleNames<'a> {
        RoleNames {
            role: &self.config.identity.role,
            instance_profile: &self.config.identity.instance_profile,
            policy: &self.config.identity.policy_name,
        }
    }

    fn role_service(&self) -> RoleService<'a, C::Iam> {
        RoleService::new(self.clients.iam(), self.propagation_delay)
    }
}
