// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RepoError` — the taxonomy surfaced to callers above storage (spec §7).

use crate::backend::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("entity already exists")]
    AlreadyExists,
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] BackendError),
    #[error("operation cancelled")]
    Cancelled,
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("document codec error: {0}")]
    Codec(String),
}

impl RepoError {
    /// Repositories surface only classified errors (spec §7); anything a
    /// deserialization bug or bson encode failure raises is wrapped here
    /// rather than panicking.
    pub fn codec(err: impl std::fmt::Display) -> Self {
        RepoError::Codec(err.to_string())
    }
}

impl From<bson::ser::Error> for RepoError {
    fn from(err: bson::ser::Error) -> Self {
        RepoError::codec(err)
    }
}

impl From<bson::de::Error> for RepoError {
    fn from(err: bson::de::Error) -> Self {
        RepoError::codec(err)
    }
}
