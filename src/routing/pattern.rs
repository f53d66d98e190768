//! Route pattern compilation.
//!
//! # Responsibilities
//! - Turn `/home/:str:name/:int:id` style patterns into an anchored regex
//! - Record placeholders left to right with their declared type
//! - Extract typed values from a matching path
//! - Fill a pattern back in from positional arguments (reverse URLs)
//!
//! # Design Decisions
//! - Placeholders may appear anywhere in the pattern (`/post-:int:id`,
//!   `/file/:name.:ext`); a colon right after `?` or `\` is regex syntax
//!   (`(?:a|b)`, `\:`) and stays literal
//! - `:name` and `:str:name` capture `\w+`, `:int:name` captures `\d+`,
//!   `:path:name` captures `.*`
//! - The compiled capture count must equal the placeholder count; literal
//!   regex fragments have to use non-capturing groups
//! - Compilation happens once at registration; a pattern is immutable after

use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;
use thiserror::Error;

use crate::routing::params::{ParamValue, Params};

/// Upper bound on compiled regex size, guards against pathological patterns.
const MAX_REGEX_SIZE: usize = 1 << 20;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r":(\w+)(?::(\w+))?").expect("placeholder regex is valid")
    })
}

/// Errors raised while compiling a route pattern. These are configuration
/// errors and surface at registration time.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("unknown placeholder type `{tag}` in pattern `{pattern}` (expected str, int or path)")]
    UnknownType { pattern: String, tag: String },

    #[error("invalid route pattern `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern `{pattern}` has {captures} capture group(s) for {placeholders} placeholder(s); use (?:...) for literal groups")]
    CaptureMismatch {
        pattern: String,
        captures: usize,
        placeholders: usize,
    },
}

/// Errors returned when building a URL from a route name. These are values,
/// never panics, so template helpers can render them in place of a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReverseError {
    #[error("route `{name}` not found")]
    UnknownRoute { name: String },

    #[error("route group `{group}` not found")]
    UnknownGroup { group: String },

    #[error("pattern `{pattern}` takes {expected} argument(s) but {given} were supplied")]
    ArgumentCount {
        pattern: String,
        expected: usize,
        given: usize,
    },

    #[error("placeholder `{name}` expects an integer, got `{value}`")]
    ArgumentType { name: String, value: String },

    #[error("arguments for pattern `{pattern}` produced `{url}`, which the pattern does not match")]
    Unmatched { pattern: String, url: String },
}

/// Declared placeholder type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Int,
    Path,
}

impl ParamKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "str" => Some(ParamKind::Str),
            "int" => Some(ParamKind::Int),
            "path" => Some(ParamKind::Path),
            _ => None,
        }
    }

    fn capture(self) -> &'static str {
        match self {
            ParamKind::Str => r"(\w+)",
            ParamKind::Int => r"(\d+)",
            ParamKind::Path => r"(.*)",
        }
    }

    fn format(self, name: &str, value: &ParamValue) -> Result<String, ReverseError> {
        match (self, value) {
            (ParamKind::Int, ParamValue::Str(s)) => Err(ReverseError::ArgumentType {
                name: name.to_string(),
                value: s.clone(),
            }),
            (_, ParamValue::Int(i)) => Ok(i.to_string()),
            (_, ParamValue::Str(s)) => Ok(s.clone()),
        }
    }

    fn convert(self, raw: &str) -> Option<ParamValue> {
        match self {
            ParamKind::Int => raw.parse().ok().map(ParamValue::Int),
            ParamKind::Str | ParamKind::Path => Some(ParamValue::Str(raw.to_string())),
        }
    }
}

/// A named, typed placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub kind: ParamKind,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Param(usize),
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    matcher: Regex,
    placeholders: Vec<Placeholder>,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a pattern. Leading `^` and trailing `$` are optional; the
    /// result is always anchored at both ends.
    pub fn compile(raw: &str) -> Result<Self, PatternError> {
        let body = raw.strip_prefix('^').unwrap_or(raw);
        let body = body.strip_suffix('$').unwrap_or(body);

        let mut expr = String::with_capacity(body.len() + 16);
        expr.push('^');
        let mut placeholders = Vec::new();
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(body) {
            let (Some(whole), Some(first)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if matches!(body[..whole.start()].chars().next_back(), Some('?' | '\\')) {
                continue;
            }
            let literal = &body[last..whole.start()];
            expr.push_str(literal);
            segments.push(Segment::Literal(unescape(literal)));

            let placeholder = match caps.get(2) {
                Some(name) => Placeholder {
                    name: name.as_str().to_string(),
                    kind: ParamKind::from_tag(first.as_str()).ok_or_else(|| {
                        PatternError::UnknownType {
                            pattern: raw.to_string(),
                            tag: first.as_str().to_string(),
                        }
                    })?,
                },
                None => Placeholder {
                    name: first.as_str().to_string(),
                    kind: ParamKind::Str,
                },
            };
            expr.push_str(placeholder.kind.capture());
            segments.push(Segment::Param(placeholders.len()));
            placeholders.push(placeholder);
            last = whole.end();
        }

        let tail = &body[last..];
        expr.push_str(tail);
        segments.push(Segment::Literal(unescape(tail)));
        expr.push('$');

        let matcher = RegexBuilder::new(&expr)
            .size_limit(MAX_REGEX_SIZE)
            .build()
            .map_err(|source| PatternError::Regex {
                pattern: raw.to_string(),
                source,
            })?;

        let captures = matcher.captures_len() - 1;
        if captures != placeholders.len() {
            return Err(PatternError::CaptureMismatch {
                pattern: raw.to_string(),
                captures,
                placeholders: placeholders.len(),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            matcher,
            placeholders,
            segments,
        })
    }

    /// The pattern as registered.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The anchored regex this pattern compiled to.
    pub fn as_regex(&self) -> &str {
        self.matcher.as_str()
    }

    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Parse placeholder values out of `path`.
    ///
    /// Returns `None` when the path does not match. An `int` placeholder
    /// whose digits overflow `i64` is treated as a non-match.
    pub fn extract(&self, path: &str) -> Option<Params> {
        let caps = self.matcher.captures(path)?;
        let mut entries = Vec::with_capacity(self.placeholders.len());
        for (index, placeholder) in self.placeholders.iter().enumerate() {
            let raw = caps.get(index + 1).map_or("", |m| m.as_str());
            let value = placeholder.kind.convert(raw)?;
            entries.push((placeholder.name.clone(), value));
        }
        Some(Params::new(entries))
    }

    /// Build a concrete path from positional arguments, one per placeholder
    /// occurrence. The result must match the pattern, so values a
    /// placeholder would not capture and regex-only literal text are errors.
    pub fn fill(&self, args: &[ParamValue]) -> Result<String, ReverseError> {
        if args.len() != self.placeholders.len() {
            return Err(ReverseError::ArgumentCount {
                pattern: self.raw.clone(),
                expected: self.placeholders.len(),
                given: args.len(),
            });
        }

        let mut url = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Param(index) => {
                    let placeholder = &self.placeholders[*index];
                    url.push_str(&placeholder.kind.format(&placeholder.name, &args[*index])?);
                }
            }
        }
        if !self.matcher.is_match(&url) {
            return Err(ReverseError::Unmatched {
                pattern: self.raw.clone(),
                url,
            });
        }
        Ok(url)
    }
}

/// Drop regex escapes from literal text (`\.` becomes `.`).
fn unescape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
