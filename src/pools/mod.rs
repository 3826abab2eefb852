//! # Work pools: named, typed execution capacity.
//!
//! - [`PoolKind`] - pool type enum (`process`, `docker`, `kubernetes`)
//! - [`PoolSpec`] - creation parameters (description, labels, tags, capacity)
//! - [`WorkPool`] - a pool with a semaphore-backed capacity counter
//! - [`WorkPoolManager`] - name-keyed store with get-or-create semantics

mod manager;
mod pool;

pub use manager::WorkPoolManager;
pub use pool::{PoolKind, PoolSpec, WorkPool};
