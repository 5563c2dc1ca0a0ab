use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP methods a route module may export
///
/// `ALL` is the catch-all method: an entry registered under it matches
/// every request method.
///
/// # Examples
///
/// ```
/// use fsrouter::Method;
///
/// let method: Method = "POST".parse().unwrap();
/// assert!(method.accepts("POST"));
/// assert!(!method.accepts("GET"));
/// assert!(Method::All.accepts("PATCH"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    All,
}

impl Method {
    /// Every recognized method, in the order exports are validated
    pub const VARIANTS: [Method; 8] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
        Method::All,
    ];

    /// Export name for this method (`GET`, `POST`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::All => "ALL",
        }
    }

    /// Whether an entry registered under this method handles `request_method`
    pub fn accepts(&self, request_method: &str) -> bool {
        match self {
            Method::All => true,
            method => method.as_str().eq_ignore_ascii_case(request_method),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses an export name; matching is case-sensitive because exports are identifiers
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::VARIANTS
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or(())
    }
}
