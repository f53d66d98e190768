//! Path prefix matching.
//!
//! # Responsibilities
//! - Decide whether a request path falls under a group prefix
//! - Strip the prefix so group routes see a path relative to it
//! - Recognise static asset paths (directory prefix or exact file)
//!
//! # Design Decisions
//! - Prefixes match on a segment boundary: `/admin` matches `/admin` and
//!   `/admin/x`, never `/administrator`
//! - Matching is case-sensitive
//! - No regex here; prefix checks are plain string comparisons

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches a path prefix on a segment boundary.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    /// Create a new prefix matcher.
    /// The prefix is normalized to start with `/` and carry no trailing `/`.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        let prefix = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        Self { prefix }
    }

    /// The normalized prefix (`/` for the root).
    pub fn prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    /// True when the prefix normalized to the root and would match every path.
    pub fn is_root(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Length used to order overlapping prefixes (longest first).
    pub fn specificity(&self) -> usize {
        self.prefix.len()
    }

    /// Strip the prefix, returning the remaining path (at least `/`).
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Join a group-relative path back under this prefix.
    pub fn join(&self, relative: &str) -> String {
        if relative.starts_with('/') {
            format!("{}{}", self.prefix, relative)
        } else {
            format!("{}/{}", self.prefix, relative)
        }
    }
}

impl Matcher for PrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }
}

/// Matches one exact path.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    path: String,
}

impl ExactMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactMatcher {
    fn matches(&self, path: &str) -> bool {
        path == self.path
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matcher_segment_boundary() {
        let matcher = PrefixMatcher::new("/admin/");
        assert_eq!(matcher.prefix(), "/admin");

        assert!(matcher.matches("/admin"));
        assert!(matcher.matches("/admin/users"));
        assert!(!matcher.matches("/administrator"));
        assert!(!matcher.matches("/"));
    }

    #[test]
    fn test_prefix_strip_and_join() {
        let matcher = PrefixMatcher::new("blog");
        assert_eq!(matcher.strip("/blog"), Some("/"));
        assert_eq!(matcher.strip("/blog/post/3"), Some("/post/3"));
        assert_eq!(matcher.join("/post/3"), "/blog/post/3");
        assert_eq!(matcher.join("feed"), "/blog/feed");
    }

    #[test]
    fn test_any_matcher() {
        let matcher = AnyMatcher::new(vec![
            Box::new(PrefixMatcher::new("/static")),
            Box::new(ExactMatcher::new("/favicon.ico")),
        ]);
        assert!(matcher.matches("/static/css/site.css"));
        assert!(matcher.matches("/favicon.ico"));
        assert!(!matcher.matches("/favicon.ico.bak"));
        assert!(!matcher.matches("/staticky"));
    }
}
