//! Pattern matching for repository names and file paths.
//!
//! This is a restricted glob dialect, not general regex. Patterns are typed by
//! end users, so the set of constructs is small and every compiled pattern is
//! fully anchored and escaped. Compiled expressions run on the `regex` crate,
//! which guarantees linear-time matching.
//!
//! Precedence:
//! 1. exact equality
//! 2. `*` or `**` match everything
//! 3. `prefix/*` matches values starting with `prefix`
//! 4. `*/suffix` matches values ending with `suffix`
//! 5. any pattern containing `**` is compiled as a glob
//! 6. anything else does not match
//!
//! Rule patterns are compiled once per config snapshot via `CompiledPattern`
//! and `CompiledMatcher`; `matches` compiles on the spot for one-off checks.

use regex::Regex;

/// One pattern, classified and (for `**` globs) compiled up front.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    raw: String,
    kind: Kind,
}

#[derive(Debug, Clone)]
enum Kind {
    Any,
    Prefix(String),
    Suffix(String),
    /// None if the expression failed to compile; such a glob never matches.
    Glob(Option<Regex>),
    Literal,
}

impl CompiledPattern {
    pub fn new(pattern: &str) -> Self {
        let kind = if is_catch_all(pattern) {
            Kind::Any
        } else if let Some(prefix) = pattern.strip_suffix("/*") {
            Kind::Prefix(prefix.to_string())
        } else if let Some(suffix) = pattern.strip_prefix("*/") {
            Kind::Suffix(suffix.to_string())
        } else if pattern.contains("**") {
            Kind::Glob(compile_glob(pattern))
        } else {
            Kind::Literal
        };
        Self {
            raw: pattern.to_string(),
            kind,
        }
    }

    /// Returns true if `value` matches. Never fails.
    pub fn matches(&self, value: &str) -> bool {
        if value == self.raw {
            return true;
        }
        match &self.kind {
            Kind::Any => true,
            Kind::Prefix(prefix) => value.starts_with(prefix.as_str()),
            Kind::Suffix(suffix) => value.ends_with(suffix.as_str()),
            Kind::Glob(Some(re)) => re.is_match(value),
            Kind::Glob(None) | Kind::Literal => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// A compiled pattern list. Matches when any of its patterns does.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    patterns: Vec<CompiledPattern>,
}

impl CompiledMatcher {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| CompiledPattern::new(p)).collect(),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(value))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Returns true if `value` matches `pattern`. Never fails.
pub fn matches(value: &str, pattern: &str) -> bool {
    CompiledPattern::new(pattern).matches(value)
}

/// Whether a pattern matches every possible value.
pub fn is_catch_all(pattern: &str) -> bool {
    pattern == "*" || pattern == "**"
}

/// Compile a `**` glob into an anchored regex.
///
/// `**` spans separators, `*` stays within one path segment, `?` is exactly one
/// character. Everything else, `.` included, is literal.
pub fn compile_glob(pattern: &str) -> Option<Regex> {
    let mut expr = String::with_capacity(pattern.len() * 2 + 2);
    expr.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    expr.push_str(".*");
                } else {
                    expr.push_str("[^/]*");
                }
            }
            '?' => expr.push('.'),
            other => {
                let mut buf = [0u8; 4];
                expr.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }

    expr.push('$');
    match Regex::new(&expr) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!("pattern '{}' did not compile: {}", pattern, e);
            None
        }
    }
}
