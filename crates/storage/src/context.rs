// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handle every repository is built from: the backend, resolved
//! collection names, and the retry policy.

use crate::backend::StoreBackend;
use crate::collections::CollectionNames;
use crate::error::RepoError;
use crate::indexes;
use crate::retry::RetryConfig;
use std::sync::Arc;

pub struct StorageContext {
    pub backend: Arc<dyn StoreBackend>,
    pub names: CollectionNames,
    pub retry: RetryConfig,
}

impl StorageContext {
    pub fn new(backend: Arc<dyn StoreBackend>, names: CollectionNames) -> Arc<Self> {
        Arc::new(Self { backend, names, retry: RetryConfig::default() })
    }

    pub fn with_retry(backend: Arc<dyn StoreBackend>, names: CollectionNames, retry: RetryConfig) -> Arc<Self> {
        Arc::new(Self { backend, names, retry })
    }

    /// Ensure every index spec'd in spec §4.1 exists. Call once at
    /// `Initialize` (spec §4.7).
    pub async fn ensure_indexes(&self) -> Result<(), RepoError> {
        for (collection, specs) in indexes::all(&self.names) {
            self.backend.ensure_indexes(&collection, &specs).await.map_err(RepoError::Persistence)?;
        }
        Ok(())
    }
}
