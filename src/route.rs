//! Attaching guards to routes
//!
//! The host router only needs one thing from this crate: "given where the user
//! is going, where should they go instead, if anywhere?" That question is
//! answered by [`execute_guard`], by the [`GuardedRoute`] and
//! [`GuardedShellRoute`] traits, and by [`create_guard_redirect`], which turns
//! any guard into a redirect hook.
//!
//! [`RouteGuards`] is a small registry for routers without their own guard
//! slots: it matches the target path against registered patterns and runs the
//! guards that apply.

use crate::composite::CompositeGuard;
use crate::context::{GuardState, NavigationContext};
use crate::guards::{evaluate, BoxedGuard, RouteGuard};
use crate::matcher::RoutePattern;
use crate::{debug_log, error_log, info_log, trace_log, GuardResult};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Future returned by a [`GuardRedirect`] hook
pub type RedirectFuture = BoxFuture<'static, GuardResult<Option<String>>>;

/// Redirect hook handed to the host router
///
/// Resolves to `Some(path)` to send navigation elsewhere, `None` to proceed.
pub type GuardRedirect = Arc<dyn Fn(NavigationContext, GuardState) -> RedirectFuture + Send + Sync>;

/// Evaluate `guard` and translate the outcome for the host router
///
/// Guard failures are logged at error level and returned unchanged.
pub async fn execute_guard(
    guard: &dyn RouteGuard,
    context: &NavigationContext,
    state: &GuardState,
) -> GuardResult<Option<String>> {
    match evaluate(guard, context, state).await {
        Ok(outcome) => Ok(outcome.into_redirect()),
        Err(error) => {
            error_log!(
                "Guard '{}' failed for {}: {}",
                guard.name(),
                state.location,
                error
            );
            Err(error)
        }
    }
}

/// Turn a guard into a redirect hook
///
/// # Example
///
/// ```
/// use navigator_guards::{create_guard_redirect, redirect_to, GuardState, NavigationContext, StaticHost};
/// use std::sync::Arc;
///
/// let hook = create_guard_redirect(redirect_to("/login"));
/// let context = NavigationContext::new(Arc::new(StaticHost::new("/")));
///
/// let redirect = pollster::block_on(hook(context, GuardState::new("/admin")));
/// assert_eq!(redirect.unwrap(), Some("/login".to_string()));
/// ```
pub fn create_guard_redirect<G: RouteGuard>(guard: G) -> GuardRedirect {
    redirect_hook(Arc::new(guard))
}

fn redirect_hook(guard: BoxedGuard) -> GuardRedirect {
    Arc::new(move |context: NavigationContext, state: GuardState| {
        let guard = guard.clone();
        let future = async move {
            execute_guard(guard.as_ref(), &context, &state).await
        };
        Box::pin(future) as RedirectFuture
    })
}

/// A route protected by a guard
pub trait GuardedRoute: Send + Sync {
    /// Guard protecting this route
    fn guard(&self) -> &dyn RouteGuard;

    /// Run the guard for a navigation to this route
    fn execute_guard<'a>(
        &'a self,
        context: &'a NavigationContext,
        state: &'a GuardState,
    ) -> BoxFuture<'a, GuardResult<Option<String>>> {
        Box::pin(execute_guard(self.guard(), context, state))
    }
}

/// A layout route whose guard covers every route nested under it
pub trait GuardedShellRoute: Send + Sync {
    /// Guard protecting the nested routes
    fn guard(&self) -> &dyn RouteGuard;

    /// Run the guard for a navigation below this shell
    fn execute_guard<'a>(
        &'a self,
        context: &'a NavigationContext,
        state: &'a GuardState,
    ) -> BoxFuture<'a, GuardResult<Option<String>>> {
        Box::pin(execute_guard(self.guard(), context, state))
    }
}

// ============================================================================
// Route / ShellRoute
// ============================================================================

/// A guarded route pattern
#[derive(Clone)]
pub struct Route {
    pattern: RoutePattern,
    name: Option<String>,
    guard: BoxedGuard,
}

impl Route {
    /// Protect routes matching `pattern` with `guard`
    pub fn new<G: RouteGuard>(pattern: &str, guard: G) -> GuardResult<Self> {
        Self::from_boxed(pattern, Arc::new(guard))
    }

    /// Protect routes matching `pattern` with a shared guard
    pub fn from_boxed(pattern: &str, guard: BoxedGuard) -> GuardResult<Self> {
        Ok(Self {
            pattern: RoutePattern::parse(pattern)?,
            name: None,
            guard,
        })
    }

    /// Set the route name reported in [`GuardState::name`]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Pattern this route matches
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Name set with [`name`](Self::name)
    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl GuardedRoute for Route {
    fn guard(&self) -> &dyn RouteGuard {
        self.guard.as_ref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.source())
            .field("name", &self.name)
            .field("guard", &self.guard.name())
            .finish()
    }
}

/// A guarded layout covering every path its pattern matches
///
/// Shell patterns usually end in `*` so they cover nested routes.
#[derive(Clone)]
pub struct ShellRoute {
    pattern: RoutePattern,
    guard: BoxedGuard,
}

impl ShellRoute {
    /// Cover paths matching `pattern` with `guard`
    pub fn new<G: RouteGuard>(pattern: &str, guard: G) -> GuardResult<Self> {
        Self::from_boxed(pattern, Arc::new(guard))
    }

    /// Cover paths matching `pattern` with a shared guard
    pub fn from_boxed(pattern: &str, guard: BoxedGuard) -> GuardResult<Self> {
        Ok(Self {
            pattern: RoutePattern::parse(pattern)?,
            guard,
        })
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Whether this shell covers `path`
    pub fn covers(&self, path: &str) -> bool {
        self.pattern.matches(path).is_some()
    }
}

impl GuardedShellRoute for ShellRoute {
    fn guard(&self) -> &dyn RouteGuard {
        self.guard.as_ref()
    }
}

impl fmt::Debug for ShellRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellRoute")
            .field("pattern", &self.pattern.source())
            .field("guard", &self.guard.name())
            .finish()
    }
}

// ============================================================================
// RouteGuards
// ============================================================================

/// A matched route and its captured parameters
#[derive(Debug)]
pub struct RouteMatch<'r> {
    /// The route that matched
    pub route: &'r Route,
    /// Parameters captured from the path
    pub params: HashMap<String, String>,
}

/// Registry of guarded routes and shells
///
/// For each navigation the guards of every covering shell run in registration
/// order, then the guard of the best matching route, all as one
/// sequential-forward `All`. When neither a shell nor a route matches, the
/// router-level guard runs; without one the navigation proceeds.
///
/// # Example
///
/// ```
/// use navigator_guards::{allow, redirect_to, Route, RouteGuards, ShellRoute};
/// use navigator_guards::{GuardState, NavigationContext, StaticHost};
/// use std::sync::Arc;
///
/// let registry = RouteGuards::new()
///     .shell(ShellRoute::new("/admin/*", redirect_to("/login")).unwrap())
///     .route(Route::new("/users/:id", allow()).unwrap());
///
/// let context = NavigationContext::new(Arc::new(StaticHost::new("/")));
/// let admin = pollster::block_on(registry.execute(&context, &GuardState::new("/admin/users")));
/// assert_eq!(admin.unwrap(), Some("/login".to_string()));
///
/// let user = pollster::block_on(registry.execute(&context, &GuardState::new("/users/7")));
/// assert_eq!(user.unwrap(), None);
/// ```
#[derive(Clone, Default)]
pub struct RouteGuards {
    shells: Vec<ShellRoute>,
    routes: Vec<Route>,
    router_guard: Option<BoxedGuard>,
}

impl RouteGuards {
    /// Empty registry that lets every navigation through
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a guarded route
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Register a guarded shell
    pub fn shell(mut self, shell: ShellRoute) -> Self {
        self.shells.push(shell);
        self
    }

    /// Guard used when no shell or route matches
    pub fn router_guard<G: RouteGuard>(mut self, guard: G) -> Self {
        self.router_guard = Some(Arc::new(guard));
        self
    }

    /// Registered routes, in registration order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Registered shells, in registration order
    pub fn shells(&self) -> &[ShellRoute] {
        &self.shells
    }

    /// Best matching route for `path`: highest priority, then first registered
    pub fn match_route(&self, path: &str) -> Option<RouteMatch<'_>> {
        let mut best: Option<RouteMatch<'_>> = None;
        for route in &self.routes {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };
            let priority = route.pattern.priority();
            let better = best
                .as_ref()
                .map_or(true, |current| priority > current.route.pattern.priority());
            if better {
                best = Some(RouteMatch { route, params });
            }
        }
        best
    }

    /// Run every guard that applies to `state`
    ///
    /// The state handed to guards carries the matched route's parameters and
    /// name.
    pub async fn execute(
        &self,
        context: &NavigationContext,
        state: &GuardState,
    ) -> GuardResult<Option<String>> {
        let mut chain: Vec<BoxedGuard> = self
            .shells
            .iter()
            .filter(|shell| shell.covers(&state.path))
            .map(|shell| shell.guard.clone())
            .collect();

        let mut state = state.clone();
        if let Some(RouteMatch { route, params }) = self.match_route(&state.path) {
            trace_log!("{} matched route {}", state.path, route.pattern);
            state.params.extend(params);
            if let Some(name) = &route.name {
                state.name = Some(name.clone());
            }
            chain.push(route.guard.clone());
        }

        let redirect = if chain.is_empty() {
            match &self.router_guard {
                Some(guard) => {
                    debug_log!("No guarded route for {}; using router guard", state.path);
                    execute_guard(guard.as_ref(), context, &state).await?
                }
                None => None,
            }
        } else {
            let guard = CompositeGuard::all(chain).with_name("RouteGuards");
            execute_guard(&guard, context, &state).await?
        };

        if let Some(path) = &redirect {
            info_log!("Navigation to {} redirected to {}", state.location, path);
        }
        Ok(redirect)
    }

    /// Turn the registry into a redirect hook
    pub fn into_redirect(self) -> GuardRedirect {
        let registry = Arc::new(self);
        Arc::new(move |context: NavigationContext, state: GuardState| {
            let registry = registry.clone();
            Box::pin(async move { registry.execute(&context, &state).await }) as RedirectFuture
        })
    }
}

impl fmt::Debug for RouteGuards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let router_guard = self.router_guard.as_ref().map(|g| g.name());
        f.debug_struct("RouteGuards")
            .field("shells", &self.shells)
            .field("routes", &self.routes)
            .field("router_guard", &router_guard)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticHost;
    use crate::guards::{allow, block, guard_fn, redirect_to};
    use crate::GuardError;
    use parking_lot::Mutex;

    fn context() -> NavigationContext {
        NavigationContext::new(Arc::new(StaticHost::new("/home")))
    }

    fn run(registry: &RouteGuards, target: &str) -> GuardResult<Option<String>> {
        pollster::block_on(registry.execute(&context(), &GuardState::new(target)))
    }

    #[test]
    fn test_execute_guard_translates_outcome() {
        let state = GuardState::new("/a");
        let allowed = pollster::block_on(execute_guard(&allow(), &context(), &state));
        assert_eq!(allowed.unwrap(), None);

        let blocked = pollster::block_on(execute_guard(&block(), &context(), &state));
        assert_eq!(blocked.unwrap(), Some("/home".to_string()));
    }

    #[test]
    fn test_execute_guard_returns_guard_failure() {
        let guard = guard_fn(|_, _, _| async { Err(GuardError::custom("store offline")) });
        let state = GuardState::new("/reports");
        let error = pollster::block_on(execute_guard(&guard, &context(), &state)).unwrap_err();
        assert_eq!(error.to_string(), "store offline");

        let registry = RouteGuards::new().router_guard(guard);
        assert!(run(&registry, "/reports").is_err());
    }

    #[test]
    fn test_guarded_route_trait() {
        let route = Route::new("/admin", redirect_to("/login")).unwrap();
        let state = GuardState::new("/admin");
        let redirect = pollster::block_on(route.execute_guard(&context(), &state));
        assert_eq!(redirect.unwrap(), Some("/login".to_string()));

        let shell = ShellRoute::new("/settings/*", allow()).unwrap();
        assert!(shell.covers("/settings/profile"));
        let state = GuardState::new("/settings");
        let redirect = pollster::block_on(shell.execute_guard(&context(), &state));
        assert_eq!(redirect.unwrap(), None);
    }

    #[test]
    fn test_redirect_hook_is_reusable() {
        let hook = create_guard_redirect(redirect_to("/login"));
        for _ in 0..2 {
            let redirect = pollster::block_on(hook(context(), GuardState::new("/admin")));
            assert_eq!(redirect.unwrap(), Some("/login".to_string()));
        }
    }

    #[test]
    fn test_shells_run_before_route() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let record = |label: &'static str| {
            let calls = calls.clone();
            guard_fn(move |resolver, _, _| {
                calls.lock().push(label);
                async move {
                    resolver.next();
                    Ok(())
                }
            })
        };

        let registry = RouteGuards::new()
            .route(Route::new("/admin/users", record("route")).unwrap())
            .shell(ShellRoute::new("/admin/*", record("admin shell")).unwrap())
            .shell(ShellRoute::new("/*", record("root shell")).unwrap());

        assert_eq!(run(&registry, "/admin/users").unwrap(), None);
        assert_eq!(*calls.lock(), vec!["admin shell", "root shell", "route"]);
    }

    #[test]
    fn test_shell_redirect_stops_chain() {
        let registry = RouteGuards::new()
            .shell(ShellRoute::new("/admin/*", redirect_to("/login")).unwrap())
            .route(Route::new("/admin/users", redirect_to("/never")).unwrap());

        assert_eq!(
            run(&registry, "/admin/users").unwrap(),
            Some("/login".to_string())
        );
    }

    #[test]
    fn test_most_specific_route_wins() {
        let registry = RouteGuards::new()
            .route(Route::new("/users/:id", redirect_to("/generic")).unwrap())
            .route(Route::new("/users/me", redirect_to("/specific")).unwrap());

        assert_eq!(
            run(&registry, "/users/me").unwrap(),
            Some("/specific".to_string())
        );
        assert_eq!(
            run(&registry, "/users/7").unwrap(),
            Some("/generic".to_string())
        );
        assert_eq!(registry.match_route("/users/7").unwrap().params["id"], "7");
    }

    #[test]
    fn test_guards_see_params_and_name() {
        let guard = guard_fn(|resolver, _, state| {
            let ok = state.param("id") == Some("42")
                && state.name.as_deref() == Some("user.show");
            async move {
                if ok {
                    resolver.next();
                    Ok(())
                } else {
                    resolver.redirect("/wrong")
                }
            }
        });
        let route = Route::new("/users/:id", guard).unwrap().name("user.show");
        let registry = RouteGuards::new().route(route);

        assert_eq!(run(&registry, "/users/42?tab=posts").unwrap(), None);
    }

    #[test]
    fn test_router_guard_fallback() {
        let registry = RouteGuards::new()
            .route(Route::new("/public", allow()).unwrap())
            .router_guard(redirect_to("/not-found"));

        assert_eq!(run(&registry, "/public").unwrap(), None);
        assert_eq!(
            run(&registry, "/missing").unwrap(),
            Some("/not-found".to_string())
        );
    }

    #[test]
    fn test_no_match_without_router_guard_proceeds() {
        let registry = RouteGuards::new().route(Route::new("/admin", block()).unwrap());
        assert_eq!(run(&registry, "/feed").unwrap(), None);
    }

    #[test]
    fn test_registry_as_redirect_hook() {
        let hook = RouteGuards::new()
            .route(Route::new("/admin", redirect_to("/login")).unwrap())
            .into_redirect();
        let redirect = pollster::block_on(hook(context(), GuardState::new("/admin")));
        assert_eq!(redirect.unwrap(), Some("/login".to_string()));
    }

    #[test]
    fn test_invalid_route_pattern() {
        let error = Route::new("/users/:id<(>", allow()).unwrap_err();
        assert!(error.is_configuration());
    }
}
