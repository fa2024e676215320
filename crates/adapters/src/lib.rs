// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! schedstore-adapters: the driven sides of `schedstore_storage::StoreBackend`
//! — `MongoBackend` over the real driver — plus `DistributedMutex` (spec
//! §4.2), the TTL-based coordination primitive every storage manager and the
//! fire manager acquire before mutating shared state.

pub mod mongo;
pub mod mutex;

pub use mongo::MongoBackend;
pub use mutex::{DistributedMutex, MutexError};

/// Canonical in-process `StoreBackend` fake (spec §4.1's "MemoryBackend").
/// Lives in `schedstore-storage` because that crate's own repository unit
/// tests need it and cannot depend on this crate; re-exported here so
/// callers above this layer reach it at the documented path.
#[cfg(any(test, feature = "test-support"))]
pub use schedstore_storage::testing::MemoryBackend;
