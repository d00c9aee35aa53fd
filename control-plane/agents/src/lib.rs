//! Control plane agent for remote replication management.
//!
//! The agent keeps an in-memory registry of the replication topology
//! (sets, groups, pairs, volumes and systems) backed by the persistent
//! store, validates which link operations are legal on which elements,
//! and orchestrates the dispatch of link operations to the device driver.

/// Common service errors.
pub mod errors;

/// The in-memory registry and the resource specs it owns.
pub mod controller;

/// Replication topology queries, operation validation and orchestration.
pub mod replication;

/// The srdf device adapter.
pub mod srdf;

#[cfg(test)]
pub(crate) mod test_utils;
