//! Logical composition of guards
//!
//! One guard type, [`CompositeGuard`], covers every operator. The operator is a
//! [`CompositeKind`] tag and a single interpreter evaluates the children in the
//! requested [`ExecutionOrder`].
//!
//! | Kind | Passes when | Short-circuits on |
//! |------|-------------|-------------------|
//! | `All` | every child allows | first redirect |
//! | `AnyOf` | at least one child allows | first allow |
//! | `OneOf` | exactly one child allows | second allow |
//!
//! Concurrent evaluation runs every child to completion and then reduces the
//! outcomes in list order, so it always selects what sequential-forward
//! evaluation would have selected for the same decisions.

use crate::context::{GuardState, NavigationContext};
use crate::guards::{evaluate, BoxedGuard, GuardFuture, RouteGuard};
use crate::resolver::{GuardOutcome, NavigationResolver};
use crate::{debug_log, trace_log, warn_log, GuardError, GuardResult};
use futures::future::join_all;

/// Order in which a composite evaluates its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionOrder {
    /// One at a time, first to last
    #[default]
    SequentialForward,
    /// One at a time, last to first
    SequentialReverse,
    /// All at once, outcomes reduced in list order
    Concurrent,
}

/// Boolean operator applied by a [`CompositeGuard`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeKind {
    /// Every child must allow
    All,

    /// At least one child must allow
    AnyOf {
        /// Redirect used instead of the first failure when no child allows
        fallback_redirect: Option<String>,
    },

    /// Exactly one child must allow
    OneOf {
        /// Redirect used when more than one child allows; blocks when unset
        redirect_on_tie: Option<String>,
        /// Redirect used instead of the first failure when no child allows
        fallback_redirect: Option<String>,
    },
}

impl CompositeKind {
    fn operator(&self) -> &'static str {
        match self {
            CompositeKind::All => "All",
            CompositeKind::AnyOf { .. } => "AnyOf",
            CompositeKind::OneOf { .. } => "OneOf",
        }
    }
}

/// What the composite reports once its children have been reduced
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Allow,
    Redirect(String),
    Block,
}

/// Running reduction of child outcomes
struct Tally<'k> {
    kind: &'k CompositeKind,
    passes: usize,
    first_failure: Option<(usize, String)>,
}

impl<'k> Tally<'k> {
    fn new(kind: &'k CompositeKind) -> Self {
        Self {
            kind,
            passes: 0,
            first_failure: None,
        }
    }

    /// Feed the outcome of the child at `index`; `Some` means decided
    fn observe(&mut self, index: usize, outcome: GuardOutcome) -> Option<Verdict> {
        match (self.kind, outcome) {
            (CompositeKind::All, GuardOutcome::Allow) => None,
            (CompositeKind::All, GuardOutcome::Redirect { path }) => Some(Verdict::Redirect(path)),
            (CompositeKind::AnyOf { .. }, GuardOutcome::Allow) => Some(Verdict::Allow),
            (CompositeKind::OneOf { redirect_on_tie, .. }, GuardOutcome::Allow) => {
                self.passes += 1;
                if self.passes < 2 {
                    return None;
                }
                Some(match redirect_on_tie {
                    Some(path) => Verdict::Redirect(path.clone()),
                    None => Verdict::Block,
                })
            }
            (_, GuardOutcome::Redirect { path }) => {
                let earlier = self
                    .first_failure
                    .as_ref()
                    .is_some_and(|(seen, _)| *seen < index);
                if !earlier {
                    self.first_failure = Some((index, path));
                }
                None
            }
        }
    }

    /// Verdict once every child has been observed
    fn finish(self) -> Verdict {
        let fallback = match self.kind {
            CompositeKind::All => return Verdict::Allow,
            CompositeKind::OneOf { .. } if self.passes == 1 => return Verdict::Allow,
            CompositeKind::AnyOf { fallback_redirect }
            | CompositeKind::OneOf {
                fallback_redirect, ..
            } => fallback_redirect,
        };

        match (fallback, self.first_failure) {
            (Some(path), _) => Verdict::Redirect(path.clone()),
            (None, Some((_, path))) => Verdict::Redirect(path),
            (None, None) => Verdict::Block,
        }
    }
}

/// Boolean combination of guards
///
/// # Example
///
/// ```
/// use navigator_guards::{allow, evaluate, guards, redirect_to, CompositeGuard, ExecutionOrder};
/// use navigator_guards::{GuardOutcome, GuardState, NavigationContext, StaticHost};
/// use std::sync::Arc;
///
/// let guard = CompositeGuard::any_of(guards![redirect_to("/login"), allow()])
///     .execution_order(ExecutionOrder::Concurrent);
///
/// let context = NavigationContext::new(Arc::new(StaticHost::new("/")));
/// let outcome = pollster::block_on(evaluate(&guard, &context, &GuardState::new("/feed")));
/// assert_eq!(outcome.unwrap(), GuardOutcome::Allow);
/// ```
pub struct CompositeGuard {
    kind: CompositeKind,
    children: Vec<BoxedGuard>,
    order: ExecutionOrder,
    name: Option<String>,
}

impl CompositeGuard {
    /// Create a composite of `kind` over `children`
    pub fn new(kind: CompositeKind, children: impl IntoIterator<Item = BoxedGuard>) -> Self {
        Self {
            kind,
            children: children.into_iter().collect(),
            order: ExecutionOrder::default(),
            name: None,
        }
    }

    /// Every child must allow
    pub fn all(children: impl IntoIterator<Item = BoxedGuard>) -> Self {
        Self::new(CompositeKind::All, children)
    }

    /// At least one child must allow
    pub fn any_of(children: impl IntoIterator<Item = BoxedGuard>) -> Self {
        Self::new(
            CompositeKind::AnyOf {
                fallback_redirect: None,
            },
            children,
        )
    }

    /// Exactly one child must allow
    pub fn one_of(children: impl IntoIterator<Item = BoxedGuard>) -> Self {
        Self::new(
            CompositeKind::OneOf {
                redirect_on_tie: None,
                fallback_redirect: None,
            },
            children,
        )
    }

    /// Alias for [`all`](Self::all)
    pub fn and(children: impl IntoIterator<Item = BoxedGuard>) -> Self {
        Self::all(children)
    }

    /// Alias for [`any_of`](Self::any_of)
    pub fn or(children: impl IntoIterator<Item = BoxedGuard>) -> Self {
        Self::any_of(children)
    }

    /// Alias for [`one_of`](Self::one_of)
    pub fn xor(children: impl IntoIterator<Item = BoxedGuard>) -> Self {
        Self::one_of(children)
    }

    /// Append a child guard
    pub fn guard<G: RouteGuard>(mut self, guard: G) -> Self {
        self.children.push(std::sync::Arc::new(guard));
        self
    }

    /// Set the execution order
    pub fn execution_order(mut self, order: ExecutionOrder) -> Self {
        self.order = order;
        self
    }

    /// Redirect used when no child allows (`AnyOf`, `OneOf`)
    pub fn fallback_redirect(mut self, path: impl Into<String>) -> Self {
        match &mut self.kind {
            CompositeKind::AnyOf { fallback_redirect }
            | CompositeKind::OneOf {
                fallback_redirect, ..
            } => *fallback_redirect = Some(path.into()),
            CompositeKind::All => {
                warn_log!("fallback_redirect has no effect on All; ignoring");
            }
        }
        self
    }

    /// Redirect used when more than one child allows (`OneOf`)
    pub fn redirect_on_tie(mut self, path: impl Into<String>) -> Self {
        match &mut self.kind {
            CompositeKind::OneOf {
                redirect_on_tie, ..
            } => *redirect_on_tie = Some(path.into()),
            other => {
                warn_log!(
                    "redirect_on_tie has no effect on {}; ignoring",
                    other.operator()
                );
            }
        }
        self
    }

    /// Name the composite for logs and errors
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The operator
    pub fn kind(&self) -> &CompositeKind {
        &self.kind
    }

    /// The child guards, in list order
    pub fn children(&self) -> &[BoxedGuard] {
        &self.children
    }

    /// The execution order
    pub fn order(&self) -> ExecutionOrder {
        self.order
    }

    fn validate(&self) -> GuardResult<()> {
        let operator = self.kind.operator();
        if self.children.is_empty() && !matches!(self.kind, CompositeKind::All) {
            return Err(GuardError::EmptyGuardList { operator });
        }

        let (tie, fallback) = match &self.kind {
            CompositeKind::All => (None, None),
            CompositeKind::AnyOf { fallback_redirect } => (None, fallback_redirect.as_deref()),
            CompositeKind::OneOf {
                redirect_on_tie,
                fallback_redirect,
            } => (redirect_on_tie.as_deref(), fallback_redirect.as_deref()),
        };
        if tie == Some("") || fallback == Some("") {
            return Err(GuardError::EmptyRedirectPath { operator });
        }
        Ok(())
    }

    async fn decide(
        &self,
        context: &NavigationContext,
        state: &GuardState,
    ) -> GuardResult<Verdict> {
        self.validate()?;
        if self.children.is_empty() {
            debug_log!(
                "{} has no children; allowing {}",
                self.name(),
                state.location
            );
            return Ok(Verdict::Allow);
        }

        let mut tally = Tally::new(&self.kind);
        match self.order {
            ExecutionOrder::SequentialForward | ExecutionOrder::SequentialReverse => {
                let mut indices: Vec<usize> = (0..self.children.len()).collect();
                if self.order == ExecutionOrder::SequentialReverse {
                    indices.reverse();
                }
                for index in indices {
                    let outcome = evaluate(self.children[index].as_ref(), context, state).await?;
                    if let Some(verdict) = tally.observe(index, outcome) {
                        trace_log!(
                            "{} short-circuited at child {} of {}",
                            self.name(),
                            index,
                            self.children.len()
                        );
                        return Ok(verdict);
                    }
                }
            }
            ExecutionOrder::Concurrent => {
                let results = join_all(
                    self.children
                        .iter()
                        .map(|child| evaluate(child.as_ref(), context, state)),
                )
                .await;
                for (index, result) in results.into_iter().enumerate() {
                    if let Some(verdict) = tally.observe(index, result?) {
                        return Ok(verdict);
                    }
                }
            }
        }
        Ok(tally.finish())
    }
}

impl RouteGuard for CompositeGuard {
    fn on_navigation<'a>(
        &'a self,
        resolver: NavigationResolver,
        context: &'a NavigationContext,
        state: &'a GuardState,
    ) -> GuardFuture<'a> {
        Box::pin(async move {
            let verdict = self.decide(context, state).await?;
            debug_log!(
                "{} decided {:?} for {}",
                self.name(),
                verdict,
                state.location
            );
            match verdict {
                Verdict::Allow => {
                    resolver.next();
                    Ok(())
                }
                Verdict::Redirect(path) => resolver.redirect(path),
                Verdict::Block => resolver.block(),
            }
        })
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.kind.operator())
    }
}
