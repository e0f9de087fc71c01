//! Error types for feedrelay operations.
//!
//! This module defines the main error type [`FeedRelayError`] which represents
//! the failures that can prevent a formatting pass from producing a usable
//! payload. Recoverable, user-authored misconfigurations (a malformed regex in
//! a filter or transform step, an unparsable date) are deliberately *not*
//! errors: those degrade locally, are logged, and the pass continues.
//!
//! # Example
//!
//! ```rust
//! use feedrelay_core::{FeedRelayError, Result};
//!
//! fn check_depth(depth: usize) -> Result<()> {
//!     if depth > 10 {
//!         return Err(FeedRelayError::FilterTooDeep { depth });
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Main error type for article-to-message formatting operations.
#[derive(Error, Debug)]
pub enum FeedRelayError {
    /// The medium configuration has nothing to deliver.
    ///
    /// Returned when a medium configures no content template, embeds, or
    /// components, so no deliverable payload could ever be produced from it.
    /// Forum metadata and webhook identity only decorate payloads and do not
    /// count as deliverable on their own.
    #[error("Medium configuration has no deliverable fields")]
    EmptyMediumConfig,

    /// A filter expression tree exceeds the supported nesting depth.
    ///
    /// Returned by validation, never during evaluation.
    #[error("Filter expression nesting depth {depth} exceeds the maximum of 10")]
    FilterTooDeep { depth: usize },
}

/// Result type alias for FeedRelayError.
pub type Result<T> = std::result::Result<T, FeedRelayError>;
