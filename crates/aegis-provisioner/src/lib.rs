//! aegis-provisioner - idempotent setup and teardown of the aegis AWS topology
//!
//! This crate provides the `aegis` binary that creates, reuses and removes an
//! encryption key, an object bucket, an audit table, a worker role and one
//! tagged worker instance. Every create is safe to repeat and every delete is
//! best-effort.

pub mod aws;
pub mod config;
pub mod orchestrator;
pub mod services;
pub mod wait;

#[cfg(test)]
pub mod testing;
