//! Time-bounded guard evaluation
//!
//! Guards normally get as long as they need. [`TimeoutGuard`] caps that for a
//! single guard and decides what the navigation does when the cap elapses.
//! The timer comes from tokio, so evaluation must run inside a tokio runtime
//! with the time driver enabled.

use crate::context::{GuardState, NavigationContext};
use crate::guards::{evaluate, BoxedGuard, GuardFuture, RouteGuard};
use crate::resolver::NavigationResolver;
use crate::{warn_log, GuardError};
use std::sync::Arc;
use std::time::Duration;

/// What happens when the inner guard is too slow
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimeoutAction {
    /// Fail evaluation with [`GuardError::Timeout`]
    #[default]
    Fail,
    /// Deny through the resolver's block semantics
    Block,
    /// Send navigation to this path
    Redirect(String),
}

/// Guard wrapper that bounds how long its inner guard may take
///
/// # Example
///
/// ```
/// use navigator_guards::{allow, RouteGuardExt, TimeoutAction};
/// use std::time::Duration;
///
/// let guard = allow()
///     .with_timeout(Duration::from_secs(2))
///     .on_timeout(TimeoutAction::Redirect("/offline".into()));
/// ```
pub struct TimeoutGuard {
    inner: BoxedGuard,
    after: Duration,
    action: TimeoutAction,
}

impl TimeoutGuard {
    /// Wrap `inner` with a limit of `after`
    pub fn new<G: RouteGuard>(inner: G, after: Duration) -> Self {
        Self::from_boxed(Arc::new(inner), after)
    }

    /// Wrap an already shared guard
    pub fn from_boxed(inner: BoxedGuard, after: Duration) -> Self {
        Self {
            inner,
            after,
            action: TimeoutAction::default(),
        }
    }

    /// Choose what an elapsed limit means
    pub fn on_timeout(mut self, action: TimeoutAction) -> Self {
        self.action = action;
        self
    }

    pub fn after(&self) -> Duration {
        self.after
    }

    pub fn action(&self) -> &TimeoutAction {
        &self.action
    }
}

impl RouteGuard for TimeoutGuard {
    fn on_navigation<'a>(
        &'a self,
        resolver: NavigationResolver,
        context: &'a NavigationContext,
        state: &'a GuardState,
    ) -> GuardFuture<'a> {
        Box::pin(async move {
            let inner = evaluate(self.inner.as_ref(), context, state);
            match tokio::time::timeout(self.after, inner).await {
                Ok(outcome) => resolver.resolve(outcome?),
                Err(_) => {
                    warn_log!(
                        "Guard '{}' did not resolve {} within {:?}",
                        self.inner.name(),
                        state.location,
                        self.after
                    );
                    match &self.action {
                        TimeoutAction::Fail => Err(GuardError::Timeout {
                            guard: self.inner.name().to_string(),
                            after: self.after,
                        }),
                        TimeoutAction::Block => resolver.block(),
                        TimeoutAction::Redirect(path) => resolver.redirect(path.as_str()),
                    }
                }
            }
        })
    }

    fn name(&self) -> &str {
        "TimeoutGuard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticHost;
    use crate::guards::{guard_fn, redirect_to, RouteGuardExt};
    use crate::resolver::GuardOutcome;
    use crate::GuardResult;

    fn slow(delay: Duration) -> impl RouteGuard {
        guard_fn(move |resolver, _, _| async move {
            tokio::time::sleep(delay).await;
            resolver.next();
            Ok(())
        })
        .named("slow")
    }

    async fn run(guard: &TimeoutGuard) -> GuardResult<GuardOutcome> {
        let context = NavigationContext::new(Arc::new(StaticHost::new("/home")));
        evaluate(guard, &context, &GuardState::new("/reports")).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_guard_passes_through() {
        let guard = redirect_to("/login").with_timeout(Duration::from_secs(1));
        assert_eq!(run(&guard).await.unwrap(), GuardOutcome::redirect("/login"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_guard_within_limit() {
        let guard = slow(Duration::from_millis(500)).with_timeout(Duration::from_secs(1));
        assert_eq!(run(&guard).await.unwrap(), GuardOutcome::Allow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_by_default() {
        let guard = slow(Duration::from_secs(5)).with_timeout(Duration::from_secs(1));
        match run(&guard).await.unwrap_err() {
            GuardError::Timeout { guard, after } => {
                assert_eq!(guard, "slow");
                assert_eq!(after, Duration::from_secs(1));
            }
            other => panic!("Expected Timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_actions() {
        let guard = slow(Duration::from_secs(5))
            .with_timeout(Duration::from_secs(1))
            .on_timeout(TimeoutAction::Block);
        assert_eq!(run(&guard).await.unwrap(), GuardOutcome::redirect("/home"));

        let guard = slow(Duration::from_secs(5))
            .with_timeout(Duration::from_secs(1))
            .on_timeout(TimeoutAction::Redirect("/offline".to_string()));
        let expected = TimeoutAction::Redirect("/offline".to_string());
        assert_eq!(guard.action(), &expected);
        assert_eq!(
            run(&guard).await.unwrap(),
            GuardOutcome::redirect("/offline")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_inner_error_propagates() {
        let guard = guard_fn(|_, _, _| async { Err(GuardError::custom("store offline")) })
            .with_timeout(Duration::from_secs(1));
        assert_eq!(run(&guard).await.unwrap_err().to_string(), "store offline");
    }
}
