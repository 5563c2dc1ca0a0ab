//! Request-time behaviour of a compiled table
//!
//! The generated worker hands the table to a JavaScript router. This module
//! implements the same contract in Rust so precedence can be checked without
//! a JavaScript runtime:
//!
//! - entries are tried in table order
//! - an entry applies when its method is `ALL` or equals the request method,
//!   and its pattern matches the path
//! - handlers run in order; the first one returning a response wins,
//!   returning `None` passes the request on (middleware)
//! - if nothing answers, `404 Not found`

use crate::error::{Error, Result};
use crate::method::Method;
use crate::route::CompiledPattern;
use crate::table::{HandlerRef, RouteTable};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

// ============================================================================
// Request / Response
// ============================================================================

/// An incoming request as handlers see it
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    /// Path without query string
    pub path: String,
    /// Decoded query parameters; a key without `=` maps to `""`
    pub query: HashMap<String, String>,
    /// Named captures of the entry currently handling the request
    pub params: HashMap<String, String>,
    /// Per-request scratch space shared by middleware and handlers, empty on arrival
    pub ctx: HashMap<String, Value>,
}

impl Request {
    /// Builds a request from a method and a path or URL
    ///
    /// ```
    /// use fsrouter::dispatch::Request;
    ///
    /// let req = Request::new("GET", "https://example.com/search?q=rust%20lang&page=2&debug");
    /// assert_eq!(req.path, "/search");
    /// assert_eq!(req.query["q"], "rust lang");
    /// assert_eq!(req.query["page"], "2");
    /// assert_eq!(req.query["debug"], "");
    /// ```
    pub fn new(method: &str, url: &str) -> Self {
        let without_origin = match url.find("://") {
            Some(scheme_end) => {
                let rest = &url[scheme_end + 3..];
                rest.find(['/', '?']).map(|i| &rest[i..]).unwrap_or("/")
            }
            None => url,
        };
        let without_fragment = without_origin
            .split_once('#')
            .map(|(before, _)| before)
            .unwrap_or(without_origin);
        let (path, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        Self {
            method: method.to_ascii_uppercase(),
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query: parse_query(query),
            ..Self::default()
        }
    }
}

/// Later occurrences of a key replace earlier ones
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// `200` with a JSON body
    pub fn json(value: &Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// The built-in `404 Not found`
    pub fn not_found() -> Self {
        Self::new(404, "Not found")
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// A resolved handler: `Some` answers the request, `None` passes it on
pub type Handler = Arc<dyn Fn(&mut Request) -> Option<Response> + Send + Sync>;

/// Handlers by the references a table uses for them
///
/// # Examples
///
/// ```
/// use fsrouter::dispatch::{HandlerRegistry, Response};
/// use fsrouter::table::{ExportPath, HandlerRef};
/// use fsrouter::Method;
///
/// let mut registry = HandlerRegistry::new();
/// registry.register(
///     HandlerRef::export("/app/src/get.ts", ExportPath::Method(Method::Get)),
///     |_req| Some(Response::ok("hello")),
/// );
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerRef, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `reference`, replacing any previous one
    pub fn register<F>(&mut self, reference: HandlerRef, handler: F) -> &mut Self
    where
        F: Fn(&mut Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.handlers.insert(reference, Arc::new(handler));
        self
    }

    /// `HandlerRef::NotFound` resolves to the built-in 404 unless overridden
    pub fn resolve(&self, reference: &HandlerRef) -> Result<Handler> {
        match (self.handlers.get(reference), reference) {
            (Some(handler), _) => Ok(Arc::clone(handler)),
            (None, HandlerRef::NotFound) => {
                let builtin: Handler = Arc::new(|_: &mut Request| Some(Response::not_found()));
                Ok(builtin)
            }
            (None, other) => Err(Error::UnresolvedHandler(other.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

struct ResolvedEntry {
    method: Method,
    pattern: CompiledPattern,
    handlers: Vec<Handler>,
}

/// A table with every handler reference resolved
pub struct Dispatcher {
    entries: Vec<ResolvedEntry>,
}

impl Dispatcher {
    /// Resolves every reference of `table` once
    ///
    /// # Errors
    ///
    /// `Error::UnresolvedHandler` for the first reference the registry lacks.
    pub fn from_table(table: &RouteTable, registry: &HandlerRegistry) -> Result<Self> {
        let entries = table
            .iter()
            .map(|entry| -> Result<ResolvedEntry> {
                let handlers = entry
                    .handlers
                    .iter()
                    .map(|reference| registry.resolve(reference))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ResolvedEntry {
                    method: entry.method,
                    pattern: entry.pattern.clone(),
                    handlers,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Runs the request through the table; first response wins
    pub fn dispatch(&self, req: &mut Request) -> Response {
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.method.accepts(&req.method) {
                continue;
            }
            let Some(params) = entry.pattern.captures(&req.path) else {
                continue;
            };

            trace!(index, method = %entry.method, pattern = %entry.pattern, "Entry matched");
            req.params = params;

            for handler in &entry.handlers {
                if let Some(response) = handler(req) {
                    return response;
                }
            }
        }

        Response::not_found()
    }

    /// Dispatches a fresh request
    pub fn handle(&self, method: &str, url: &str) -> Response {
        self.dispatch(&mut Request::new(method, url))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|entry| (entry.method, entry.pattern.source(), entry.handlers.len())),
            )
            .finish()
    }
}
