// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level error taxonomy (spec §4.8): wraps [`RepoError`]/[`MutexError`]
//! without adding storage-specific variants — managers translate anything
//! unexpected into `Persistence` rather than inventing a new kind per caller.

use schedstore_adapters::MutexError;
use schedstore_storage::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("entity already exists")]
    AlreadyExists,
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

impl From<RepoError> for EngineError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::AlreadyExists => EngineError::AlreadyExists,
            RepoError::Integrity(msg) => EngineError::Integrity(msg),
            RepoError::Persistence(backend_err) => EngineError::Persistence(backend_err.to_string()),
            RepoError::Cancelled => EngineError::Cancelled,
            RepoError::NotImplemented(op) => EngineError::NotImplemented(op),
            RepoError::Codec(msg) => EngineError::Persistence(msg),
        }
    }
}

impl From<MutexError> for EngineError {
    fn from(err: MutexError) -> Self {
        match err {
            MutexError::Cancelled => EngineError::Cancelled,
            MutexError::Backend(backend_err) => EngineError::Persistence(backend_err.to_string()),
            MutexError::NotOwner { lock_type } => EngineError::Persistence(format!("{lock_type} lock released by a non-owner")),
        }
    }
}
