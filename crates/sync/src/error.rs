// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for cinder-sync operations.

use thiserror::Error;

/// All possible errors that can occur in cinder-sync operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] cinder_core::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// A specialized Result type for cinder-sync operations.
pub type Result<T> = std::result::Result<T, Error>;
