// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for cinder-core operations.

use thiserror::Error;

/// All possible errors that can occur in cinder-core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The document tree nests deeper than the prune pass supports.
    ///
    /// The tree is left untouched when this is returned. Hitting it means a
    /// documented capacity assumption was violated by the caller, not a
    /// recoverable runtime condition.
    #[error("document tree deeper than {max_depth} levels: prune aborted")]
    TreeTooDeep {
        /// The supported nesting bound.
        max_depth: usize,
    },
}

/// A specialized Result type for cinder-core operations.
pub type Result<T> = std::result::Result<T, Error>;
