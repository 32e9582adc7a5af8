//! Engine configuration
//!
//! There is no process-wide state: a [`GuardConfig`] is built once at startup
//! and handed to every [`NavigationContext`](crate::NavigationContext), which
//! passes it on to each resolver it creates.

use crate::{GuardError, GuardResult};

/// Configuration consulted while resolving navigation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardConfig {
    /// Path used by `block()` instead of the current location
    pub fallback_path: Option<String>,
}

impl GuardConfig {
    /// Create a configuration with no fallback path
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path `block()` redirects to
    ///
    /// Usually an "unauthorized" page. When unset, a blocked navigation stays
    /// on the location the user was already at.
    ///
    /// # Example
    ///
    /// ```
    /// use navigator_guards::GuardConfig;
    ///
    /// let config = GuardConfig::new().with_fallback_path("/unauthorized");
    /// assert_eq!(config.fallback_path.as_deref(), Some("/unauthorized"));
    /// ```
    pub fn with_fallback_path(mut self, path: impl Into<String>) -> Self {
        self.fallback_path = Some(path.into());
        self
    }

    /// Reject configurations that would redirect to an empty path
    pub fn validate(&self) -> GuardResult<()> {
        match self.fallback_path.as_deref() {
            Some("") => Err(GuardError::EmptyRedirectPath {
                operator: "GuardConfig",
            }),
            _ => Ok(()),
        }
    }
}
