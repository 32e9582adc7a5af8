//! Single-resolution navigation outcome carrier
//!
//! Every guard evaluation gets a fresh [`NavigationResolver`]. The guard
//! reports its decision by calling [`next`](NavigationResolver::next),
//! [`redirect`](NavigationResolver::redirect) or
//! [`block`](NavigationResolver::block). Only the first call takes effect;
//! later calls are silently ignored, so a guard with several exit branches
//! may reach more than one of them.
//!
//! The resolver is a cheap handle. Clones share the same outcome, which lets a
//! guard move the resolver into a spawned task and resolve from there.

use crate::context::{GuardState, NavigationContext};
use crate::{trace_log, GuardError, GuardResult};
use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Final decision for a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GuardOutcome {
    /// Navigation proceeds unmodified
    Allow,

    /// Navigation goes to `path` instead
    Redirect {
        /// Path to navigate to
        path: String,
    },
}

impl GuardOutcome {
    /// Create a redirect outcome
    pub fn redirect(path: impl Into<String>) -> Self {
        GuardOutcome::Redirect { path: path.into() }
    }

    /// Check if navigation is allowed
    pub fn is_allow(&self) -> bool {
        matches!(self, GuardOutcome::Allow)
    }

    /// Check if navigation is redirected
    pub fn is_redirect(&self) -> bool {
        matches!(self, GuardOutcome::Redirect { .. })
    }

    /// Get the redirect path, if any
    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            GuardOutcome::Redirect { path } => Some(path.as_str()),
            GuardOutcome::Allow => None,
        }
    }

    /// Translate into the host router's "redirect path or nothing" form
    pub fn into_redirect(self) -> Option<String> {
        match self {
            GuardOutcome::Allow => None,
            GuardOutcome::Redirect { path } => Some(path),
        }
    }
}

type OutcomeReceiver = Shared<oneshot::Receiver<GuardOutcome>>;

struct ResolverInner {
    context: NavigationContext,
    target_path: String,
    resolved: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<GuardOutcome>>>,
    outcome: OutcomeReceiver,
}

/// One-shot carrier for a guard's decision
///
/// # Example
///
/// ```
/// use navigator_guards::{GuardOutcome, GuardState, NavigationContext, NavigationResolver, StaticHost};
/// use std::sync::Arc;
///
/// let context = NavigationContext::new(Arc::new(StaticHost::new("/home")));
/// let resolver = NavigationResolver::new(context, &GuardState::new("/admin"));
/// let outcome = resolver.outcome();
///
/// resolver.redirect("/login").unwrap();
/// resolver.next(); // ignored, already resolved
///
/// let outcome = pollster::block_on(outcome);
/// assert_eq!(outcome, Some(GuardOutcome::redirect("/login")));
/// ```
#[derive(Clone)]
pub struct NavigationResolver {
    inner: Arc<ResolverInner>,
}

impl NavigationResolver {
    /// Create a resolver for one navigation attempt towards `state`
    pub fn new(context: NavigationContext, state: &GuardState) -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            inner: Arc::new(ResolverInner {
                context,
                target_path: state.location.clone(),
                resolved: AtomicBool::new(false),
                sender: Mutex::new(Some(sender)),
                outcome: receiver.shared(),
            }),
        }
    }

    /// Allow navigation to proceed
    pub fn next(&self) {
        self.resolve_once(GuardOutcome::Allow);
    }

    /// Send navigation to `path` instead
    ///
    /// An empty path is rejected and leaves the resolver unresolved.
    pub fn redirect(&self, path: impl Into<String>) -> GuardResult<()> {
        if self.is_resolved() {
            return Ok(());
        }
        let path = path.into();
        if path.is_empty() {
            return Err(GuardError::EmptyRedirectPath {
                operator: "NavigationResolver::redirect",
            });
        }
        self.resolve_once(GuardOutcome::Redirect { path });
        Ok(())
    }

    /// Deny navigation without an explicit target
    ///
    /// Redirects to the configured fallback path, or to the location the user
    /// is already at when no fallback is configured.
    pub fn block(&self) -> GuardResult<()> {
        if self.is_resolved() {
            return Ok(());
        }
        let path = self.block_target()?;
        self.resolve_once(GuardOutcome::Redirect { path });
        Ok(())
    }

    /// Report a precomputed outcome
    pub fn resolve(&self, outcome: GuardOutcome) -> GuardResult<()> {
        match outcome {
            GuardOutcome::Allow => {
                self.next();
                Ok(())
            }
            GuardOutcome::Redirect { path } => self.redirect(path),
        }
    }

    /// Path a `block()` call would redirect to right now
    pub fn block_target(&self) -> GuardResult<String> {
        let config = self.inner.context.config();
        config.validate()?;
        match &config.fallback_path {
            Some(path) => Ok(path.clone()),
            None => self.inner.context.current_location(),
        }
    }

    /// Whether a decision has been reported
    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.load(Ordering::Acquire)
    }

    /// Location this navigation is trying to reach
    pub fn target_path(&self) -> &str {
        &self.inner.target_path
    }

    /// Navigation context the resolver was created with
    pub fn context(&self) -> &NavigationContext {
        &self.inner.context
    }

    /// Wait for the decision
    ///
    /// Any number of callers may wait on the same resolver. Yields `None` when
    /// every resolver handle was dropped without a decision.
    pub fn outcome(&self) -> impl Future<Output = Option<GuardOutcome>> + Send + 'static {
        let outcome = self.inner.outcome.clone();
        async move { outcome.await.ok() }
    }

    fn resolve_once(&self, outcome: GuardOutcome) -> bool {
        if self
            .inner
            .resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace_log!(
                "Ignoring {:?} for {}: already resolved",
                outcome,
                self.inner.target_path
            );
            return false;
        }

        trace_log!("Resolved {} as {:?}", self.inner.target_path, outcome);
        if let Some(sender) = self.inner.sender.lock().take() {
            // Receiver only goes away once nobody can observe the outcome.
            let _ = sender.send(outcome);
        }
        true
    }
}

impl fmt::Debug for NavigationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationResolver")
            .field("target_path", &self.inner.target_path)
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}
