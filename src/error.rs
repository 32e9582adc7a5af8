//! Error types for guard evaluation
//!
//! Configuration mistakes (empty guard lists, empty redirect paths, bad
//! patterns) fail loudly at evaluation time. Errors raised by guard code are
//! carried through composites untouched so the host router can decide what a
//! failed navigation means.

use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while evaluating a guard expression
#[derive(Debug, Error)]
pub enum GuardError {
    /// A composite that requires children was built with none
    #[error("{operator} requires at least one guard")]
    EmptyGuardList {
        /// Operator that rejected the list (`AnyOf`, `OneOf`)
        operator: &'static str,
    },

    /// A redirect was requested with an empty target path
    #[error("{operator} was given an empty redirect path")]
    EmptyRedirectPath {
        /// Where the empty path came from
        operator: &'static str,
    },

    /// A path rule could not be compiled
    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The rejected pattern as written
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// The hosting view was torn down before navigation resolved
    #[error("navigation context is no longer mounted")]
    NotMounted,

    /// Every resolver handle was dropped without reporting a decision
    #[error("guard '{guard}' finished without resolving navigation")]
    Unresolved {
        /// Name of the guard that gave up its resolver
        guard: String,
    },

    /// A timeout wrapper elapsed before its inner guard resolved
    #[error("guard '{guard}' did not resolve within {after:?}")]
    Timeout {
        /// Name of the wrapped guard
        guard: String,
        /// Configured limit
        after: Duration,
    },

    /// Failure raised by guard code
    #[error("guard failed: {0}")]
    Guard(#[source] Box<dyn StdError + Send + Sync>),

    /// Custom error message
    #[error("{0}")]
    Custom(String),
}

impl GuardError {
    /// Wrap an arbitrary error raised inside a guard
    pub fn guard<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        GuardError::Guard(Box::new(error))
    }

    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        GuardError::Custom(message.into())
    }

    /// Check if this error points at a route setup mistake
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GuardError::EmptyGuardList { .. }
                | GuardError::EmptyRedirectPath { .. }
                | GuardError::InvalidPattern { .. }
        )
    }
}

/// Result alias used throughout the crate
pub type GuardResult<T> = Result<T, GuardError>;
