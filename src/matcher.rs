//! Route pattern matching with priorities
//!
//! Patterns decide which registered guards apply to a navigation:
//!
//! - `/users` matches that path only
//! - `/users/:id` captures one segment as `id`
//! - `/users/:id<\d+>` captures with a constraint (`\d+`, `uuid`, or any regex)
//! - `/posts/:page?` captures an optional trailing segment
//! - `/files/*` matches everything below `/files`
//!
//! More specific patterns get a higher priority so the registry can try them
//! first.

use crate::{GuardError, GuardResult};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// A parsed route pattern
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
    priority: u8,
}

impl RoutePattern {
    /// Parse a route pattern
    ///
    /// # Example
    ///
    /// ```
    /// use navigator_guards::RoutePattern;
    ///
    /// let pattern = RoutePattern::parse("/users/:id<\\d+>").unwrap();
    /// let params = pattern.matches("/users/42").unwrap();
    /// assert_eq!(params.get("id").map(String::as_str), Some("42"));
    /// assert!(pattern.matches("/users/me").is_none());
    /// ```
    pub fn parse(path: &str) -> GuardResult<Self> {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Segment::parse)
            .collect::<GuardResult<Vec<_>>>()?;

        let priority = Self::calculate_priority(&segments);
        Ok(Self {
            source: path.to_string(),
            segments,
            priority,
        })
    }

    /// All static: 100, each param: -10, each optional: -5, any wildcard: 0
    fn calculate_priority(segments: &[Segment]) -> u8 {
        let mut priority: u8 = 100;

        for segment in segments {
            match segment {
                Segment::Static(_) => {}
                Segment::Param { .. } => priority = priority.saturating_sub(10),
                Segment::Optional(_) => priority = priority.saturating_sub(5),
                Segment::Wildcard => return 0,
            }
        }

        priority
    }

    /// The pattern as written
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Higher is tried first
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Match against a path, returning captured parameters
    ///
    /// Query strings and fragments are not part of the path; callers pass
    /// [`GuardState::path`](crate::GuardState::path).
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.match_segments(&path_segments)
    }

    fn match_segments(&self, path_segments: &[&str]) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        let mut remaining = path_segments.iter().copied().peekable();

        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    if remaining.next()? != expected {
                        return None;
                    }
                }
                Segment::Param { name, constraint } => {
                    let value = remaining.next()?;
                    if !constraint.as_ref().map_or(true, |c| c.validate(value)) {
                        return None;
                    }
                    params.insert(name.clone(), value.to_string());
                }
                Segment::Optional(name) => {
                    if let Some(value) = remaining.next() {
                        params.insert(name.clone(), value.to_string());
                    }
                }
                Segment::Wildcard => return Some(params),
            }
        }

        remaining.peek().is_none().then_some(params)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A single segment in a route pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text that must match exactly
    Static(String),
    /// Captured segment
    Param {
        /// Key the captured value is stored under
        name: String,
        /// Check the captured value must pass
        constraint: Option<Constraint>,
    },
    /// Captured segment that may be missing
    Optional(String),
    /// Matches the rest of the path
    Wildcard,
}

impl Segment {
    /// Parse one segment
    ///
    /// - `users` -> `Static("users")`
    /// - `:id` -> `Param { name: "id", constraint: None }`
    /// - `:id<\d+>` -> `Param` with a constraint
    /// - `:page?` -> `Optional("page")`
    /// - `*` -> `Wildcard`
    pub fn parse(s: &str) -> GuardResult<Self> {
        if s == "*" {
            return Ok(Segment::Wildcard);
        }

        let Some(rest) = s.strip_prefix(':') else {
            return Ok(Segment::Static(s.to_string()));
        };

        if let Some(name) = rest.strip_suffix('?') {
            return Ok(Segment::Optional(name.to_string()));
        }

        match rest.split_once('<') {
            Some((name, constraint)) => {
                let constraint = constraint.strip_suffix('>').unwrap_or(constraint);
                Ok(Segment::Param {
                    name: name.to_string(),
                    constraint: Some(Constraint::parse(constraint)?),
                })
            }
            None => Ok(Segment::Param {
                name: rest.to_string(),
                constraint: None,
            }),
        }
    }
}

/// Validation applied to a captured segment
#[derive(Debug, Clone)]
pub enum Constraint {
    /// ASCII digits only
    Numeric,
    /// 8-4-4-4-12 hex groups
    Uuid,
    /// Whole-segment regular expression
    Pattern(Regex),
}

impl Constraint {
    fn parse(s: &str) -> GuardResult<Self> {
        match s {
            "\\d+" => Ok(Constraint::Numeric),
            "uuid" => Ok(Constraint::Uuid),
            _ => Regex::new(&format!("^(?:{s})$"))
                .map(Constraint::Pattern)
                .map_err(|source| GuardError::InvalidPattern {
                    pattern: s.to_string(),
                    source,
                }),
        }
    }

    /// Check a captured value
    pub fn validate(&self, value: &str) -> bool {
        match self {
            Constraint::Numeric => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
            Constraint::Uuid => {
                let parts: Vec<&str> = value.split('-').collect();
                parts.len() == 5
                    && parts
                        .iter()
                        .zip([8, 4, 4, 4, 12])
                        .all(|(part, len)| part.len() == len && is_hex(part))
            }
            Constraint::Pattern(regex) => regex.is_match(value),
        }
    }
}

fn is_hex(part: &str) -> bool {
    part.chars().all(|c| c.is_ascii_hexdigit())
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Constraint::Pattern(a), Constraint::Pattern(b)) => a.as_str() == b.as_str(),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(path: &str) -> RoutePattern {
        RoutePattern::parse(path).unwrap()
    }

    #[test]
    fn test_segment_parsing() {
        assert_eq!(
            Segment::parse("users").unwrap(),
            Segment::Static("users".to_string())
        );
        assert_eq!(
            Segment::parse(":id").unwrap(),
            Segment::Param {
                name: "id".to_string(),
                constraint: None,
            }
        );
        assert_eq!(
            Segment::parse(":page?").unwrap(),
            Segment::Optional("page".to_string())
        );
        assert_eq!(Segment::parse("*").unwrap(), Segment::Wildcard);
    }

    #[test]
    fn test_segment_parsing_with_constraint() {
        match Segment::parse(":id<\\d+>").unwrap() {
            Segment::Param { name, constraint } => {
                assert_eq!(name, "id");
                assert_eq!(constraint, Some(Constraint::Numeric));
            }
            other => panic!("Expected Param segment, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_constraint_regex() {
        let error = RoutePattern::parse("/users/:id<[a-z>").unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_priority_calculation() {
        assert_eq!(pattern("/users").priority(), 100);
        assert_eq!(pattern("/users/:id").priority(), 90);
        assert_eq!(pattern("/users/:id/posts/:postId").priority(), 80);
        assert_eq!(pattern("/posts/:page?").priority(), 95);
        assert_eq!(pattern("/files/*").priority(), 0);
    }

    #[test]
    fn test_static_route_matching() {
        let pattern = pattern("/users");
        assert!(pattern.matches("/users").is_some());
        assert!(pattern.matches("/users/").is_some());
        assert!(pattern.matches("/posts").is_none());
        assert!(pattern.matches("/users/123").is_none());
    }

    #[test]
    fn test_dynamic_route_matching() {
        let pattern = pattern("/api/users/:userId/posts/:postId");
        let params = pattern.matches("/api/users/42/posts/7").unwrap();
        assert_eq!(params.get("userId").map(String::as_str), Some("42"));
        assert_eq!(params.get("postId").map(String::as_str), Some("7"));

        assert!(pattern.matches("/api/users/42").is_none());
        assert!(pattern.matches("/api/users/42/posts/7/likes").is_none());
    }

    #[test]
    fn test_optional_segment() {
        let pattern = pattern("/posts/:page?");
        assert!(pattern.matches("/posts").unwrap().is_empty());
        let params = pattern.matches("/posts/3").unwrap();
        assert_eq!(params.get("page").map(String::as_str), Some("3"));
        assert!(pattern.matches("/posts/3/4").is_none());
    }

    #[test]
    fn test_wildcard_matching() {
        let pattern = pattern("/files/*");
        assert!(pattern.matches("/files/docs").is_some());
        assert!(pattern.matches("/files/docs/report.pdf").is_some());
        assert!(pattern.matches("/other").is_none());
    }

    #[test]
    fn test_constraints() {
        assert!(Constraint::Numeric.validate("123"));
        assert!(!Constraint::Numeric.validate("12a"));
        assert!(!Constraint::Numeric.validate(""));

        let uuid = "550e8400-e29b-41d4-a716-446655440000";
        assert!(Constraint::Uuid.validate(uuid));
        assert!(!Constraint::Uuid.validate("550e8400-e29b-41d4-a716"));

        let slug = pattern("/blog/:slug<[a-z-]+>");
        assert!(slug.matches("/blog/hello-world").is_some());
        assert!(slug.matches("/blog/Hello").is_none());
    }

    #[test]
    fn test_display_round_trips_source() {
        assert_eq!(pattern("/users/:id").to_string(), "/users/:id");
    }
}
