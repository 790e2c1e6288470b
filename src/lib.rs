//! StudyVault - session and state-synchronization core
//!
//! This library provides the client-side session layer of the StudyVault
//! document-sharing platform: authentication state, token persistence,
//! request interception, liveness checks and notification counters.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
