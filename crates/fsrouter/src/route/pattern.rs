//! Route path → anchored matcher
//!
//! The generated source uses only syntax that JavaScript and the `regex`
//! crate read the same way (named groups, lazy quantifiers, `[^…]` classes),
//! so one string drives both the emitted table and the Rust dispatcher.

use crate::error::{Error, Result};
use crate::route::syntax::transform_syntax;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

static SLASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"/+(/|$)").expect("static regex"));
static GREEDY_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(/?\.?):(\w+)\+").expect("static regex"));
static NAMED_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(/?\.?):(\w+)").expect("static regex"));
static WILDCARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(/?)\*").expect("static regex"));

/// Source of the universal fallback matcher
pub const UNIVERSAL_SOURCE: &str = "^(.*)?/*$";

/// A route path compiled into a matcher
///
/// Equality and serialization go through the matcher source.
///
/// # Examples
///
/// ```
/// use fsrouter::route::CompiledPattern;
///
/// let pattern = CompiledPattern::compile("/users/[id]").unwrap();
/// assert_eq!(pattern.source(), "^/users(/(?<id>[^//]+?))/*$");
///
/// let params = pattern.captures("/users/42").unwrap();
/// assert_eq!(params.get("id"), Some(&"42".to_string()));
/// assert!(pattern.matches("/users/42/"));
/// assert!(!pattern.matches("/users"));
/// ```
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    route: String,
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compiles a route path (bracket or colon syntax) into an anchored matcher
    ///
    /// # Errors
    ///
    /// `Error::Pattern` when the route produces an invalid expression, most
    /// commonly because two parameters share a name.
    pub fn compile(route: &str) -> Result<Self> {
        let source = route_expression(&transform_syntax(route));
        let regex = Regex::new(&source).map_err(|err| Error::Pattern {
            route: route.to_string(),
            message: err.to_string(),
        })?;

        Ok(Self {
            route: route.to_string(),
            source,
            regex,
        })
    }

    /// Matcher for `route` and everything below it, on segment boundaries
    ///
    /// ```
    /// use fsrouter::route::CompiledPattern;
    ///
    /// let scope = CompiledPattern::scope("/nested").unwrap();
    /// assert!(scope.matches("/nested"));
    /// assert!(scope.matches("/nested/deeper/still"));
    /// assert!(!scope.matches("/nestedfoo"));
    /// ```
    pub fn scope(route: &str) -> Result<Self> {
        let base = route.trim_end_matches('/');
        Self::compile(&format!("{}/*", base))
    }

    /// The catch-all matcher `^(.*)?/*$` that closes every table
    pub fn universal() -> Self {
        Self {
            route: "*".to_string(),
            source: UNIVERSAL_SOURCE.to_string(),
            regex: Regex::new(UNIVERSAL_SOURCE).expect("static regex"),
        }
    }

    /// Route path this pattern was compiled from
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Matcher source, without delimiters
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Named captures of a match; groups that did not participate are omitted
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let params = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|value| (name.to_string(), value.as_str().to_string()))
            })
            .collect();
        Some(params)
    }

    /// Parameter names in declaration order
    pub fn param_names(&self) -> Vec<&str> {
        self.regex.capture_names().flatten().collect()
    }

    /// JavaScript regular-expression literal (`/…/`) with `/` escaped
    ///
    /// ```
    /// use fsrouter::route::CompiledPattern;
    ///
    /// assert_eq!(CompiledPattern::universal().to_js_literal(), r"/^(.*)?\/*$/");
    /// ```
    pub fn to_js_literal(&self) -> String {
        let mut out = String::with_capacity(self.source.len() + 8);
        out.push('/');
        let mut escaped = false;
        for c in self.source.chars() {
            if c == '/' && !escaped {
                out.push('\\');
            }
            escaped = c == '\\' && !escaped;
            out.push(c);
        }
        out.push('/');
        out
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for CompiledPattern {}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for CompiledPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Rewrites a colon-syntax route into matcher source
///
/// Steps run in order, each on the previous output:
///
/// 1. collapse slash runs followed by a slash or the end
/// 2. `:name+` → `(/(?<name>*))` (greedy, finished by step 5)
/// 3. `:name` → `(/(?<name>[^//]+?))`, the separator is excluded from the
///    value; a trailing `?` makes the group optional
/// 4. escape `.`
/// 5. `*` → `(/.*)?`
/// 6. anchor as `^…/*$`
fn route_expression(route: &str) -> String {
    let collapsed = SLASH_RUN.replace_all(route, "${1}");
    let greedy = GREEDY_PARAM.replace_all(&collapsed, "(${1}(?<${2}>*))");
    let named = NAMED_PARAM.replace_all(&greedy, "(${1}(?<${2}>[^${1}/]+?))");
    let escaped = named.replace('.', r"\.");
    let wildcard = WILDCARD.replace_all(&escaped, "(${1}.*)?");
    format!("^{}/*$", wildcard)
}
