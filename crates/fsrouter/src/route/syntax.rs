//! Bracket file-naming syntax → canonical colon syntax
//!
//! Pure rewriting: same input → same output, no validation. Bracket groups
//! that match no rule stay in the path as literal text.

use once_cell::sync::Lazy;
use regex::Regex;

static GREEDY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\.\.\.(\w+)\]").expect("static regex"));
static WILDCARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\.\.\.\]").expect("static regex"));
static OPTIONAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(\w+)\]\]").expect("static regex"));
static SIMPLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\w+)\]").expect("static regex"));

/// Rewrites bracket parameters into colon parameters
///
/// Rules, applied in order (each one sees the previous one's output):
///
/// 1. `[...name]` → `:name+`
/// 2. `[...]` → `*`
/// 3. `[[name]]` → `:name?`
/// 4. `[name]` → `:name`
///
/// # Examples
///
/// ```
/// use fsrouter::route::syntax::transform_syntax;
///
/// assert_eq!(transform_syntax("/foo/[...bar]"), "/foo/:bar+");
/// assert_eq!(transform_syntax("/foo/[bar].[[baz]]"), "/foo/:bar.:baz?");
/// assert_eq!(transform_syntax("/foo/[bar][...baz]"), "/foo/:bar:baz+");
/// ```
pub fn transform_syntax(route: &str) -> String {
    let greedy = GREEDY.replace_all(route, ":${1}+");
    let wildcard = WILDCARD.replace_all(&greedy, "*");
    let optional = OPTIONAL.replace_all(&wildcard, ":${1}?");
    SIMPLE.replace_all(&optional, ":${1}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::greedy_params("/foo/[...bar]", "/foo/:bar+")]
    #[case::wildcard("/foo/[...]", "/foo/*")]
    #[case::optional_params("/foo/[[bar]]", "/foo/:bar?")]
    #[case::simple_params("/foo/[bar]", "/foo/:bar")]
    #[case::file_extension("/foo/[bar].[[baz]]", "/foo/:bar.:baz?")]
    #[case::simple_simple("/foo/[bar][baz]", "/foo/:bar:baz")]
    #[case::simple_greedy("/foo/[bar][...baz]", "/foo/:bar:baz+")]
    fn test_transform_syntax(#[case] route: &str, #[case] expected: &str) {
        assert_eq!(transform_syntax(route), expected);
    }

    #[rstest]
    #[case("/plain/path")]
    #[case("/foo/[bar")]
    #[case("/foo/[ba-r]")]
    #[case("/foo/[]")]
    #[case("/optional/:action?")]
    fn test_passthrough(#[case] route: &str) {
        assert_eq!(transform_syntax(route), route);
    }

    #[rstest]
    #[case("/foo/[...bar]")]
    #[case("/foo/[[bar]]/[baz].[[ext]]")]
    #[case("/a/[b][...c]/[...]")]
    fn test_idempotent(#[case] route: &str) {
        let once = transform_syntax(route);
        assert_eq!(transform_syntax(&once), once);
    }
}
