//! Path-scoped guard activation
//!
//! [`ConditionalGuard`] runs its inner guard only on paths it applies to.
//! Exclusions are checked first and always win. A path that is excluded, or
//! that misses every inclusion rule, is allowed without consulting the inner
//! guard: the guard does not apply there, it did not pass there.

use crate::context::{GuardState, NavigationContext};
use crate::guards::{BoxedGuard, GuardFuture, RouteGuard};
use crate::resolver::NavigationResolver;
use crate::{trace_log, GuardError, GuardResult};
use regex::Regex;
use std::sync::Arc;

/// A rule matched against the target path
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Path must equal this string
    Exact(String),
    /// Glob converted to an anchored regex; `source` keeps the glob as written
    Glob {
        /// The glob as written
        source: String,
        /// Compiled form
        regex: Regex,
    },
    /// Raw regular expression, unanchored unless written so
    Regex(Regex),
}

impl PathPattern {
    /// Match exactly `path`
    pub fn exact(path: impl Into<String>) -> Self {
        PathPattern::Exact(path.into())
    }

    /// Compile a glob
    ///
    /// `*` matches any run of characters, `/` included, and `**` is the same.
    /// `?` matches one character other than `/`. Everything else is literal.
    ///
    /// # Example
    ///
    /// ```
    /// use navigator_guards::PathPattern;
    ///
    /// let pattern = PathPattern::glob("/*/file?.txt").unwrap();
    /// assert!(pattern.matches("/a/file1.txt"));
    /// assert!(!pattern.matches("/a/file/.txt"));
    ///
    /// let admin = PathPattern::glob("/admin/*").unwrap();
    /// assert!(admin.matches("/admin/users/7"));
    /// ```
    pub fn glob(glob: impl Into<String>) -> GuardResult<Self> {
        let source = glob.into();
        let regex = compile(&glob_to_regex(&source), &source)?;
        Ok(PathPattern::Glob { source, regex })
    }

    /// Compile a raw regular expression
    pub fn regex(pattern: &str) -> GuardResult<Self> {
        Ok(PathPattern::Regex(compile(pattern, pattern)?))
    }

    /// Check `path` against the rule
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(expected) => expected == path,
            PathPattern::Glob { regex, .. } | PathPattern::Regex(regex) => regex.is_match(path),
        }
    }
}

impl From<Regex> for PathPattern {
    fn from(regex: Regex) -> Self {
        PathPattern::Regex(regex)
    }
}

fn compile(regex: &str, pattern: &str) -> GuardResult<Regex> {
    Regex::new(regex).map_err(|source| GuardError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Translate a glob into an anchored regular expression
pub fn glob_to_regex(glob: &str) -> String {
    let mut regex = String::with_capacity(glob.len() * 2 + 2);
    regex.push('^');

    let mut chars = glob.chars().peekable();
    let mut literal = [0u8; 4];
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                regex.push_str(".*");
            }
            '?' => regex.push_str("[^/]"),
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut literal))),
        }
    }

    regex.push('$');
    regex
}

/// Guard that only applies to selected paths
///
/// # Example
///
/// ```
/// use navigator_guards::{redirect_to, ConditionalGuard};
///
/// let guard = ConditionalGuard::new(redirect_to("/login"))
///     .include_glob("/admin/**")
///     .unwrap()
///     .exclude_path("/admin/help");
/// ```
pub struct ConditionalGuard {
    inner: BoxedGuard,
    included: Vec<PathPattern>,
    excluded: Vec<PathPattern>,
}

impl ConditionalGuard {
    /// Wrap `inner`; with no rules it applies everywhere
    pub fn new<G: RouteGuard>(inner: G) -> Self {
        Self::from_boxed(Arc::new(inner))
    }

    /// Wrap an already shared guard
    pub fn from_boxed(inner: BoxedGuard) -> Self {
        Self {
            inner,
            included: Vec::new(),
            excluded: Vec::new(),
        }
    }

    /// Apply on exactly `path`
    pub fn include_path(mut self, path: impl Into<String>) -> Self {
        self.included.push(PathPattern::exact(path));
        self
    }

    /// Apply on paths matching a glob
    pub fn include_glob(mut self, glob: impl Into<String>) -> GuardResult<Self> {
        self.included.push(PathPattern::glob(glob)?);
        Ok(self)
    }

    /// Apply on paths matching a regular expression
    pub fn include_regex(mut self, pattern: &str) -> GuardResult<Self> {
        self.included.push(PathPattern::regex(pattern)?);
        Ok(self)
    }

    /// Apply on paths matching a prebuilt rule
    pub fn include(mut self, pattern: impl Into<PathPattern>) -> Self {
        self.included.push(pattern.into());
        self
    }

    /// Never apply on exactly `path`
    pub fn exclude_path(mut self, path: impl Into<String>) -> Self {
        self.excluded.push(PathPattern::exact(path));
        self
    }

    /// Never apply on paths matching a glob
    pub fn exclude_glob(mut self, glob: impl Into<String>) -> GuardResult<Self> {
        self.excluded.push(PathPattern::glob(glob)?);
        Ok(self)
    }

    /// Never apply on paths matching a regular expression
    pub fn exclude_regex(mut self, pattern: &str) -> GuardResult<Self> {
        self.excluded.push(PathPattern::regex(pattern)?);
        Ok(self)
    }

    /// Never apply on paths matching a prebuilt rule
    pub fn exclude(mut self, pattern: impl Into<PathPattern>) -> Self {
        self.excluded.push(pattern.into());
        self
    }

    /// Whether the inner guard should run for `path`
    pub fn applies_to(&self, path: &str) -> bool {
        if self.excluded.iter().any(|rule| rule.matches(path)) {
            return false;
        }
        self.included.is_empty() || self.included.iter().any(|rule| rule.matches(path))
    }
}

impl RouteGuard for ConditionalGuard {
    fn on_navigation<'a>(
        &'a self,
        resolver: NavigationResolver,
        context: &'a NavigationContext,
        state: &'a GuardState,
    ) -> GuardFuture<'a> {
        if !self.applies_to(&state.path) {
            trace_log!(
                "Guard '{}' does not apply to {}; allowing",
                self.inner.name(),
                state.path
            );
            resolver.next();
            return Box::pin(async { Ok(()) });
        }
        self.inner.on_navigation(resolver, context, state)
    }

    fn name(&self) -> &str {
        "ConditionalGuard"
    }
}
