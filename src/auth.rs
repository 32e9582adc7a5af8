//! Built-in authentication and authorization guards
//!
//! These are ordinary guards: each one asks a user-provided async function
//! about the current user and reports a decision. None of them knows anything
//! about composition, so they combine freely with
//! [`CompositeGuard`](crate::CompositeGuard) and
//! [`ConditionalGuard`](crate::ConditionalGuard).

use crate::cache::GuardCache;
use crate::context::{GuardState, NavigationContext};
use crate::guards::{GuardFuture, RouteGuard};
use crate::resolver::NavigationResolver;
use crate::{debug_log, trace_log};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Async authentication check
pub type AuthCheckFn = Box<dyn Fn(&GuardState) -> BoxFuture<'static, bool> + Send + Sync>;

/// Async lookup of the current user's roles
pub type RoleSourceFn = Box<dyn Fn(&GuardState) -> BoxFuture<'static, Vec<String>> + Send + Sync>;

/// Async check of a single permission
pub type PermissionCheckFn = Box<dyn Fn(&str) -> BoxFuture<'static, bool> + Send + Sync>;

/// Report a failed check: redirect when a target is configured, block otherwise
fn deny(resolver: &NavigationResolver, redirect_path: Option<&str>) -> crate::GuardResult<()> {
    match redirect_path {
        Some(path) => resolver.redirect(path),
        None => resolver.block(),
    }
}

// ============================================================================
// AuthGuard
// ============================================================================

/// Redirects unauthenticated users
///
/// # Example
///
/// ```
/// use navigator_guards::AuthGuard;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// let logged_in = Arc::new(AtomicBool::new(false));
/// let session = logged_in.clone();
/// let guard = AuthGuard::new(
///     move |_state| {
///         let session = session.load(Ordering::SeqCst);
///         async move { session }
///     },
///     "/login",
/// );
/// ```
pub struct AuthGuard {
    check_fn: AuthCheckFn,
    redirect_path: String,
}

impl AuthGuard {
    /// Create an auth guard from a check and the login path
    pub fn new<F, Fut>(check_fn: F, redirect_path: impl Into<String>) -> Self
    where
        F: Fn(&GuardState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            check_fn: Box::new(move |state| Box::pin(check_fn(state))),
            redirect_path: redirect_path.into(),
        }
    }

    /// Create an auth guard that always allows access (for testing/development).
    ///
    /// **Warning**: Do not use in production!
    #[cfg(debug_assertions)]
    pub fn allow_all() -> Self {
        Self::new(|_| async { true }, "/login")
    }

    /// Create an auth guard that always denies access (for testing/development).
    ///
    /// **Warning**: Do not use in production!
    #[cfg(debug_assertions)]
    pub fn deny_all(redirect_path: impl Into<String>) -> Self {
        Self::new(|_| async { false }, redirect_path)
    }
}

impl RouteGuard for AuthGuard {
    fn on_navigation<'a>(
        &'a self,
        resolver: NavigationResolver,
        _context: &'a NavigationContext,
        state: &'a GuardState,
    ) -> GuardFuture<'a> {
        let check = (self.check_fn)(state);
        Box::pin(async move {
            if check.await {
                resolver.next();
                Ok(())
            } else {
                debug_log!("Unauthenticated navigation to {}", state.location);
                resolver.redirect(self.redirect_path.as_str())
            }
        })
    }

    fn name(&self) -> &str {
        "AuthGuard"
    }
}

// ============================================================================
// RoleGuard
// ============================================================================

const ROLES_CACHE_KEY: &str = "roles";

/// Allows users holding at least one of the required roles
///
/// # Example
///
/// ```
/// use navigator_guards::RoleGuard;
///
/// let guard = RoleGuard::new(|_state| async { vec!["editor".to_string()] }, ["admin", "editor"])
///     .with_redirect("/forbidden");
/// assert_eq!(guard.required_roles(), ["admin", "editor"]);
/// ```
pub struct RoleGuard {
    role_source: RoleSourceFn,
    required_roles: Vec<String>,
    redirect_path: Option<String>,
    cache: Option<(Arc<dyn GuardCache<Vec<String>>>, Option<Duration>)>,
}

impl RoleGuard {
    /// Create a role guard from a role lookup and the accepted roles
    pub fn new<F, Fut, I, S>(role_source: F, required_roles: I) -> Self
    where
        F: Fn(&GuardState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<String>> + Send + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role_source: Box::new(move |state| Box::pin(role_source(state))),
            required_roles: required_roles.into_iter().map(Into::into).collect(),
            redirect_path: None,
            cache: None,
        }
    }

    /// Redirect here when no role matches; blocks otherwise
    pub fn with_redirect(mut self, path: impl Into<String>) -> Self {
        self.redirect_path = Some(path.into());
        self
    }

    /// Remember looked-up roles in `cache` for `ttl`
    pub fn with_cache(
        mut self,
        cache: Arc<dyn GuardCache<Vec<String>>>,
        ttl: Option<Duration>,
    ) -> Self {
        self.cache = Some((cache, ttl));
        self
    }

    /// Forget cached roles, e.g. after login or logout
    pub fn invalidate_cache(&self) {
        if let Some((cache, _)) = &self.cache {
            cache.invalidate(ROLES_CACHE_KEY);
        }
    }

    /// Roles this guard accepts
    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    async fn user_roles(&self, state: &GuardState) -> Vec<String> {
        if let Some((cache, _)) = &self.cache {
            if let Some(roles) = cache.get(ROLES_CACHE_KEY) {
                return roles;
            }
        }

        let roles = (self.role_source)(state).await;
        if let Some((cache, ttl)) = &self.cache {
            cache.set(ROLES_CACHE_KEY, roles.clone(), *ttl);
        }
        roles
    }
}

impl RouteGuard for RoleGuard {
    fn on_navigation<'a>(
        &'a self,
        resolver: NavigationResolver,
        _context: &'a NavigationContext,
        state: &'a GuardState,
    ) -> GuardFuture<'a> {
        Box::pin(async move {
            let roles = self.user_roles(state).await;
            let authorized = roles.iter().any(|role| self.required_roles.contains(role));
            trace_log!(
                "RoleGuard: user roles {:?}, required {:?}",
                roles,
                self.required_roles
            );

            if authorized {
                resolver.next();
                Ok(())
            } else {
                deny(&resolver, self.redirect_path.as_deref())
            }
        })
    }

    fn name(&self) -> &str {
        "RoleGuard"
    }
}

// ============================================================================
// PermissionGuard
// ============================================================================

/// Allows users holding every required permission
///
/// # Example
///
/// ```
/// use navigator_guards::PermissionGuard;
///
/// let guard = PermissionGuard::new(
///     |permission| {
///         let granted = permission.starts_with("users.");
///         async move { granted }
///     },
///     "users.delete",
/// )
/// .require("users.read")
/// .with_redirect("/forbidden");
/// ```
pub struct PermissionGuard {
    check_fn: PermissionCheckFn,
    permissions: Vec<String>,
    redirect_path: Option<String>,
    cache: Option<(Arc<dyn GuardCache<bool>>, Option<Duration>)>,
}

impl PermissionGuard {
    /// Create a permission guard from a check function
    pub fn new<F, Fut>(check_fn: F, permission: impl Into<String>) -> Self
    where
        F: Fn(&str) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            check_fn: Box::new(move |permission| Box::pin(check_fn(permission))),
            permissions: vec![permission.into()],
            redirect_path: None,
            cache: None,
        }
    }

    /// Require one more permission
    pub fn require(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Add a redirect path for when permission is denied.
    pub fn with_redirect(mut self, path: impl Into<String>) -> Self {
        self.redirect_path = Some(path.into());
        self
    }

    /// Remember each permission decision in `cache` for `ttl`
    pub fn with_cache(mut self, cache: Arc<dyn GuardCache<bool>>, ttl: Option<Duration>) -> Self {
        self.cache = Some((cache, ttl));
        self
    }

    async fn has_permission(&self, permission: &str) -> bool {
        if let Some((cache, _)) = &self.cache {
            if let Some(granted) = cache.get(permission) {
                return granted;
            }
        }

        let granted = (self.check_fn)(permission).await;
        if let Some((cache, ttl)) = &self.cache {
            cache.set(permission, granted, *ttl);
        }
        granted
    }
}

impl RouteGuard for PermissionGuard {
    fn on_navigation<'a>(
        &'a self,
        resolver: NavigationResolver,
        _context: &'a NavigationContext,
        _state: &'a GuardState,
    ) -> GuardFuture<'a> {
        Box::pin(async move {
            for permission in &self.permissions {
                if !self.has_permission(permission).await {
                    debug_log!("Missing permission: {}", permission);
                    return deny(&resolver, self.redirect_path.as_deref());
                }
            }
            resolver.next();
            Ok(())
        })
    }

    fn name(&self) -> &str {
        "PermissionGuard"
    }
}
