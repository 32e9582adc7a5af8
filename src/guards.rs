//! Guard trait, evaluation entry point, and convenience constructors
//!
//! A guard receives a fresh [`NavigationResolver`] for every navigation and
//! must call exactly one of its resolution methods, either right away or after
//! any number of suspension points. A guard that drops its resolver without
//! deciding is reported as [`GuardError::Unresolved`].

use crate::context::{GuardState, NavigationContext};
use crate::resolver::{GuardOutcome, NavigationResolver};
use crate::{debug_log, trace_log, GuardError, GuardResult};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Future returned by [`RouteGuard::on_navigation`]
///
/// Resolves to `Err` only when the guard itself fails. The navigation decision
/// travels through the resolver, not through this value.
pub type GuardFuture<'a> = BoxFuture<'a, GuardResult<()>>;

/// Trait for navigation guards
///
/// Guards are built once and reused for many navigations, possibly at the
/// same time. Any mutable state they keep must be safe for that.
///
/// # Example
///
/// ```
/// use navigator_guards::{GuardFuture, GuardState, NavigationContext, NavigationResolver, RouteGuard};
///
/// struct MaintenanceGuard {
///     enabled: bool,
/// }
///
/// impl RouteGuard for MaintenanceGuard {
///     fn on_navigation<'a>(
///         &'a self,
///         resolver: NavigationResolver,
///         _context: &'a NavigationContext,
///         _state: &'a GuardState,
///     ) -> GuardFuture<'a> {
///         Box::pin(async move {
///             if self.enabled {
///                 resolver.redirect("/maintenance")
///             } else {
///                 resolver.next();
///                 Ok(())
///             }
///         })
///     }
///
///     fn name(&self) -> &str {
///         "MaintenanceGuard"
///     }
/// }
/// ```
pub trait RouteGuard: Send + Sync + 'static {
    /// Decide the navigation towards `state` through `resolver`
    fn on_navigation<'a>(
        &'a self,
        resolver: NavigationResolver,
        context: &'a NavigationContext,
        state: &'a GuardState,
    ) -> GuardFuture<'a>;

    /// Guard name for logs and error messages
    fn name(&self) -> &str {
        "RouteGuard"
    }
}

/// Shared guard for dynamic dispatch
pub type BoxedGuard = Arc<dyn RouteGuard>;

impl<G> RouteGuard for Arc<G>
where
    G: RouteGuard + ?Sized,
{
    fn on_navigation<'a>(
        &'a self,
        resolver: NavigationResolver,
        context: &'a NavigationContext,
        state: &'a GuardState,
    ) -> GuardFuture<'a> {
        (**self).on_navigation(resolver, context, state)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Run `guard` against a fresh resolver and wait for its decision
///
/// Errors returned by the guard propagate unchanged.
///
/// # Example
///
/// ```
/// use navigator_guards::{evaluate, redirect_to, GuardOutcome, GuardState, NavigationContext, StaticHost};
/// use std::sync::Arc;
///
/// let context = NavigationContext::new(Arc::new(StaticHost::new("/")));
/// let guard = redirect_to("/login");
///
/// let outcome = pollster::block_on(evaluate(&guard, &context, &GuardState::new("/admin")));
/// assert_eq!(outcome.unwrap(), GuardOutcome::redirect("/login"));
/// ```
pub async fn evaluate(
    guard: &dyn RouteGuard,
    context: &NavigationContext,
    state: &GuardState,
) -> GuardResult<GuardOutcome> {
    let resolver = NavigationResolver::new(context.clone(), state);
    let outcome = resolver.outcome();

    trace_log!("Evaluating guard '{}' for {}", guard.name(), state.location);
    guard.on_navigation(resolver, context, state).await?;

    match outcome.await {
        Some(outcome) => {
            trace_log!("Guard '{}' decided {:?}", guard.name(), outcome);
            Ok(outcome)
        }
        None => {
            debug_log!(
                "Guard '{}' dropped its resolver for {} without deciding",
                guard.name(),
                state.location
            );
            Err(GuardError::Unresolved {
                guard: guard.name().to_string(),
            })
        }
    }
}

/// Extension methods for every guard
pub trait RouteGuardExt: RouteGuard + Sized {
    /// Share the guard behind an `Arc`
    fn boxed(self) -> BoxedGuard {
        Arc::new(self)
    }

    /// Bound the guard's decision time
    #[cfg(feature = "timeout")]
    fn with_timeout(self, after: std::time::Duration) -> crate::timeout::TimeoutGuard {
        crate::timeout::TimeoutGuard::new(self, after)
    }
}

impl<G: RouteGuard> RouteGuardExt for G {}

// ============================================================================
// Function guards
// ============================================================================

/// Create a guard from a function or closure
///
/// The closure receives owned resolver and borrowed context and state; the
/// future it returns must own whatever it needs.
///
/// # Example
///
/// ```
/// use navigator_guards::guard_fn;
///
/// let guard = guard_fn(|resolver, _context, state| {
///     let is_public = state.path.starts_with("/public");
///     async move {
///         if is_public {
///             resolver.next();
///             Ok(())
///         } else {
///             resolver.redirect("/login")
///         }
///     }
/// });
/// ```
pub fn guard_fn<F, Fut>(f: F) -> FnGuard<F>
where
    F: Fn(NavigationResolver, &NavigationContext, &GuardState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = GuardResult<()>> + Send + 'static,
{
    FnGuard {
        f,
        name: "FnGuard".to_string(),
    }
}

/// Guard created from a function or closure
pub struct FnGuard<F> {
    f: F,
    name: String,
}

impl<F> FnGuard<F> {
    /// Give the guard a name for logs and errors
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F, Fut> RouteGuard for FnGuard<F>
where
    F: Fn(NavigationResolver, &NavigationContext, &GuardState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = GuardResult<()>> + Send + 'static,
{
    fn on_navigation<'a>(
        &'a self,
        resolver: NavigationResolver,
        context: &'a NavigationContext,
        state: &'a GuardState,
    ) -> GuardFuture<'a> {
        Box::pin((self.f)(resolver, context, state))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Guard that always allows
pub fn allow() -> impl RouteGuard {
    guard_fn(|resolver, _, _| async move {
        resolver.next();
        Ok(())
    })
    .named("allow")
}

/// Guard that always redirects to `path`
pub fn redirect_to(path: impl Into<String>) -> impl RouteGuard {
    let path = path.into();
    guard_fn(move |resolver, _, _| {
        let path = path.clone();
        async move { resolver.redirect(path) }
    })
    .named("redirect_to")
}

/// Guard that always blocks
pub fn block() -> impl RouteGuard {
    guard_fn(|resolver, _, _| async move { resolver.block() }).named("block")
}

/// Collect guards into a list for composite constructors
///
/// # Example
///
/// ```
/// use navigator_guards::{allow, guards, redirect_to, CompositeGuard};
///
/// let guard = CompositeGuard::all(guards![allow(), redirect_to("/login")]);
/// ```
#[macro_export]
macro_rules! guards {
    ($($guard:expr),* $(,)?) => {
        vec![$(::std::sync::Arc::new($guard) as $crate::guards::BoxedGuard),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardConfig;
    use crate::context::StaticHost;

    fn context_at(current: &str) -> NavigationContext {
        NavigationContext::new(Arc::new(StaticHost::new(current)))
    }

    fn run(
        guard: &dyn RouteGuard,
        context: &NavigationContext,
        target: &str,
    ) -> GuardResult<GuardOutcome> {
        pollster::block_on(evaluate(guard, context, &GuardState::new(target)))
    }

    #[test]
    fn test_allow_factory() {
        let guard = allow();
        assert_eq!(guard.name(), "allow");
        let outcome = run(&guard, &context_at("/"), "/a").unwrap();
        assert_eq!(outcome, GuardOutcome::Allow);
    }

    #[test]
    fn test_redirect_to_factory_is_reusable() {
        let guard = redirect_to("/login");
        let context = context_at("/");
        for _ in 0..3 {
            assert_eq!(
                run(&guard, &context, "/admin").unwrap(),
                GuardOutcome::redirect("/login")
            );
        }
    }

    #[test]
    fn test_block_factory_uses_config() {
        let guard = block();
        let config = GuardConfig::new().with_fallback_path("/nope");
        let context = context_at("/here").with_config(config);
        assert_eq!(
            run(&guard, &context, "/admin").unwrap(),
            GuardOutcome::redirect("/nope")
        );
    }

    #[test]
    fn test_guard_fn_sees_state() {
        let guard = guard_fn(|resolver, _, state| {
            let admin = state.path.starts_with("/admin");
            async move {
                if admin {
                    resolver.redirect("/login")
                } else {
                    resolver.next();
                    Ok(())
                }
            }
        });
        let context = context_at("/");
        assert_eq!(guard.name(), "FnGuard");
        assert_eq!(run(&guard, &context, "/home").unwrap(), GuardOutcome::Allow);
        assert_eq!(
            run(&guard, &context, "/admin/users").unwrap(),
            GuardOutcome::redirect("/login")
        );
    }

    #[test]
    fn test_unresolved_guard_reports_error() {
        let guard = guard_fn(|_resolver, _, _| async move { Ok(()) }).named("Forgetful");
        let error = run(&guard, &context_at("/"), "/a").unwrap_err();
        match error {
            GuardError::Unresolved { guard } => assert_eq!(guard, "Forgetful"),
            other => panic!("Expected Unresolved, got {other:?}"),
        }
    }

    #[test]
    fn test_guard_error_propagates() {
        let guard = guard_fn(|_, _, _| async { Err(GuardError::custom("boom")) });
        let error = run(&guard, &context_at("/"), "/a").unwrap_err();
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn test_resolver_moved_into_thread() {
        let guard = guard_fn(|resolver, _, _| async move {
            std::thread::spawn(move || resolver.next());
            Ok(())
        });
        let outcome = run(&guard, &context_at("/"), "/a").unwrap();
        assert_eq!(outcome, GuardOutcome::Allow);
    }

    #[test]
    fn test_boxed_guard_keeps_name() {
        let guard = allow().boxed();
        assert_eq!(guard.name(), "allow");
        let outcome = run(&guard, &context_at("/"), "/a").unwrap();
        assert_eq!(outcome, GuardOutcome::Allow);
    }

    #[test]
    fn test_guards_macro() {
        let list = guards![allow(), redirect_to("/x")];
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].name(), "redirect_to");
    }
}
