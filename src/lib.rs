//! # Navigator Guards
//!
//! Composable async navigation guards for client-side routers:
//!
//! - **Single-resolution resolver** - every guard reports exactly one decision
//! - **Composite guards** - `All`, `AnyOf` and `OneOf` with sequential or concurrent evaluation
//! - **Conditional guards** - scope a guard with exact paths, globs and regexes
//! - **Built-in guards** - authentication, roles and permissions with an injectable cache
//! - **Route attachment** - redirect hooks and a pattern-matched guard registry
//!
//! # Quick Start
//!
//! ```
//! use navigator_guards::*;
//! use std::sync::Arc;
//!
//! let is_admin = guard_fn(|resolver, _context, state| {
//!     let admin = state.query("role") == Some("admin");
//!     async move {
//!         if admin {
//!             resolver.next();
//!             Ok(())
//!         } else {
//!             resolver.redirect("/unauthorized")
//!         }
//!     }
//! });
//!
//! let guard = CompositeGuard::all(guards![allow(), is_admin]);
//!
//! let host = Arc::new(StaticHost::new("/home"));
//! let context = NavigationContext::new(host);
//!
//! let outcome = pollster::block_on(evaluate(&guard, &context, &GuardState::new("/admin?role=admin")));
//! assert_eq!(outcome.unwrap(), GuardOutcome::Allow);
//!
//! let outcome = pollster::block_on(evaluate(&guard, &context, &GuardState::new("/admin")));
//! assert_eq!(outcome.unwrap(), GuardOutcome::redirect("/unauthorized"));
//! ```
//!
//! # Blocking
//!
//! [`NavigationResolver::block`] sends the user to the configured fallback
//! path, or keeps them where they are when none is configured:
//!
//! ```
//! use navigator_guards::*;
//! use std::sync::Arc;
//!
//! let context = NavigationContext::new(Arc::new(StaticHost::new("/dashboard")))
//!     .with_config(GuardConfig::new().with_fallback_path("/unauthorized"));
//!
//! let outcome = pollster::block_on(evaluate(&block(), &context, &GuardState::new("/admin")));
//! assert_eq!(outcome.unwrap(), GuardOutcome::redirect("/unauthorized"));
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually exclusive with `log`)
//! - `cache` (default) - LRU-backed [`GuardCache`] implementation
//! - `timeout` (default) - [`TimeoutGuard`] on top of the tokio timer

#![doc(html_root_url = "https://docs.rs/navigator-guards/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Error handling and configuration
pub mod config;
pub mod error;

// Resolution core
pub mod context;
pub mod guards;
pub mod resolver;

// Combinators
pub mod composite;
pub mod conditional;

// Built-in guards and their collaborators
pub mod auth;
pub mod cache;
#[cfg(feature = "timeout")]
pub mod timeout;

// Router integration
pub mod matcher;
pub mod route;

pub use auth::{AuthGuard, PermissionGuard, RoleGuard};
pub use cache::GuardCache;
#[cfg(feature = "cache")]
pub use cache::{CacheStats, LruGuardCache};
pub use composite::{CompositeGuard, CompositeKind, ExecutionOrder};
pub use conditional::{glob_to_regex, ConditionalGuard, PathPattern};
pub use config::GuardConfig;
pub use context::{GuardState, NavigationContext, RouterHost, StaticHost};
pub use error::{GuardError, GuardResult};
pub use guards::{
    allow, block, evaluate, guard_fn, redirect_to, BoxedGuard, FnGuard, GuardFuture, RouteGuard,
    RouteGuardExt,
};
pub use matcher::{Constraint, RoutePattern, Segment};
pub use resolver::{GuardOutcome, NavigationResolver};
pub use route::{
    create_guard_redirect, execute_guard, GuardRedirect, GuardedRoute, GuardedShellRoute,
    RedirectFuture, Route, RouteGuards, RouteMatch, ShellRoute,
};
#[cfg(feature = "timeout")]
pub use timeout::{TimeoutAction, TimeoutGuard};
