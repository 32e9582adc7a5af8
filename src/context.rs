//! Navigation context handed to guards
//!
//! The engine never navigates by itself. It reads the current location from the
//! host router through [`RouterHost`] and returns a redirect path; the host
//! performs the actual navigation.

use crate::config::GuardConfig;
use crate::{GuardError, GuardResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// RouterHost
// ============================================================================

/// The host router as seen by the engine
pub trait RouterHost: Send + Sync + 'static {
    /// Location the user is currently at
    ///
    /// Returns [`GuardError::NotMounted`] once the hosting view is gone.
    fn current_location(&self) -> GuardResult<String>;

    /// Whether the hosting view is still attached
    fn is_mounted(&self) -> bool {
        true
    }
}

/// Host with a location that can be moved and detached by hand
///
/// Handy for tests and for hosts that track the location themselves.
///
/// # Example
///
/// ```
/// use navigator_guards::{RouterHost, StaticHost};
///
/// let host = StaticHost::new("/dashboard");
/// assert_eq!(host.current_location().unwrap(), "/dashboard");
///
/// host.detach();
/// assert!(host.current_location().is_err());
/// ```
#[derive(Debug)]
pub struct StaticHost {
    location: RwLock<String>,
    mounted: RwLock<bool>,
}

impl StaticHost {
    /// Create a mounted host at `location`
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: RwLock::new(location.into()),
            mounted: RwLock::new(true),
        }
    }

    /// Move the host to a new location
    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.write() = location.into();
    }

    /// Simulate the hosting view being torn down
    pub fn detach(&self) {
        *self.mounted.write() = false;
    }
}

impl RouterHost for StaticHost {
    fn current_location(&self) -> GuardResult<String> {
        if !self.is_mounted() {
            return Err(GuardError::NotMounted);
        }
        Ok(self.location.read().clone())
    }

    fn is_mounted(&self) -> bool {
        *self.mounted.read()
    }
}

// ============================================================================
// NavigationContext
// ============================================================================

/// Host router plus engine configuration, shared by every guard in a tree
#[derive(Clone)]
pub struct NavigationContext {
    host: Arc<dyn RouterHost>,
    config: Arc<GuardConfig>,
}

impl NavigationContext {
    /// Create a context with the default configuration
    pub fn new(host: Arc<dyn RouterHost>) -> Self {
        Self {
            host,
            config: Arc::new(GuardConfig::default()),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Current location of the host
    pub fn current_location(&self) -> GuardResult<String> {
        if !self.host.is_mounted() {
            return Err(GuardError::NotMounted);
        }
        self.host.current_location()
    }

    /// Whether the host is still attached
    pub fn is_mounted(&self) -> bool {
        self.host.is_mounted()
    }

    /// Engine configuration
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// The host router
    pub fn host(&self) -> &Arc<dyn RouterHost> {
        &self.host
    }
}

impl fmt::Debug for NavigationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationContext")
            .field("mounted", &self.host.is_mounted())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// GuardState
// ============================================================================

/// The navigation target a guard is asked about
///
/// # Example
///
/// ```
/// use navigator_guards::GuardState;
///
/// let state = GuardState::new("/users/42?tab=posts#top").with_param("id", "42");
/// assert_eq!(state.path, "/users/42");
/// assert_eq!(state.query("tab"), Some("posts"));
/// assert_eq!(state.param("id"), Some("42"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardState {
    /// Full target location as requested
    pub location: String,
    /// Location without query string or fragment
    pub path: String,
    /// Parsed query string
    pub query: HashMap<String, String>,
    /// Path parameters extracted by the router (e.g., `:id`)
    pub params: HashMap<String, String>,
    /// Name of the matched route, if the router has one
    pub name: Option<String>,
}

impl GuardState {
    /// Create a state for `location`, splitting off query and fragment
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        let without_fragment = location.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path.to_string(), parse_query(query)),
            None => (without_fragment.to_string(), HashMap::new()),
        };

        Self {
            location,
            path,
            query,
            params: HashMap::new(),
            name: None,
        }
    }

    /// Add a path parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the matched route name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get a path parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a query parameter
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
