//! Ordered route table assembly
//!
//! Table order is precedence: scoped middleware (deepest first), then
//! routes, then scoped notFound handlers (deepest first), then the
//! universal 404. Nothing is sorted after the fact.

use crate::discover::ClassifiedFiles;
use crate::error::Result;
use crate::inspect::{OptionKind, SourceInspector};
use crate::method::Method;
use crate::path::route_path;
use crate::route::CompiledPattern;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Inline handler of the universal fallback entry
pub const NOT_FOUND_HANDLER: &str = r#"() => new Response("Not found", { status: 404 })"#;

// ============================================================================
// Handler references
// ============================================================================

/// Member of a route module a handler is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportPath {
    /// Plain method export (`GET`)
    Method(Method),
    /// Method key of an option object (`middleware.GET`, `notFound.POST`)
    Option(OptionKind, Method),
}

impl ExportPath {
    pub fn method(&self) -> Method {
        match self {
            ExportPath::Method(method) | ExportPath::Option(_, method) => *method,
        }
    }
}

impl fmt::Display for ExportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportPath::Method(method) => write!(f, "{}", method),
            ExportPath::Option(kind, method) => write!(f, "{}.{}", kind, method),
        }
    }
}

/// Typed reference to the code that handles a table entry
///
/// # Examples
///
/// ```
/// use fsrouter::table::{ExportPath, HandlerRef};
/// use fsrouter::Method;
///
/// let handler = HandlerRef::export("/app/src/get.ts", ExportPath::Method(Method::Get));
/// assert_eq!(handler.to_js(), r#"require("/app/src/get.ts").GET"#);
/// assert_eq!(
///     HandlerRef::NotFound.to_js(),
///     r#"() => new Response("Not found", { status: 404 })"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandlerRef {
    Export { module: String, path: ExportPath },
    /// Built-in `404 Not found`
    NotFound,
}

impl HandlerRef {
    pub fn export(module: impl Into<String>, path: ExportPath) -> Self {
        HandlerRef::Export {
            module: module.into(),
            path,
        }
    }

    /// JavaScript expression evaluating to the handler
    pub fn to_js(&self) -> String {
        match self {
            HandlerRef::Export { module, path } => {
                // JSON string quoting is valid JavaScript string quoting
                let quoted = serde_json::Value::String(module.clone()).to_string();
                format!("require({}).{}", quoted, path)
            }
            HandlerRef::NotFound => NOT_FOUND_HANDLER.to_string(),
        }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js())
    }
}

impl Serialize for HandlerRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_js())
    }
}

// ============================================================================
// Table
// ============================================================================

/// One dispatch rule: `(method, pattern, handlers)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub method: Method,
    pub pattern: CompiledPattern,
    pub handlers: Vec<HandlerRef>,
}

impl RouteEntry {
    pub fn new(method: Method, pattern: CompiledPattern, handlers: Vec<HandlerRef>) -> Self {
        Self {
            method,
            pattern,
            handlers,
        }
    }

    /// The `ALL` catch-all answering `404 Not found`
    pub fn universal_not_found() -> Self {
        Self::new(
            Method::All,
            CompiledPattern::universal(),
            vec![HandlerRef::NotFound],
        )
    }
}

/// Finished, ordered dispatch table
///
/// The last entry is always [`RouteEntry::universal_not_found`]. There is
/// no way to change a table once [`TableBuilder::finish`] returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A finished table holds at least the universal fallback
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a RouteEntry;
    type IntoIter = std::slice::Iter<'a, RouteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Where route paths are computed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSettings {
    pub root_dir: PathBuf,
    /// Empty, or starting with `/`
    pub base_path: String,
}

/// Which kind of file a [`TableBuilder::process`] call handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Route file: every option object is honored, at the exact route
    Route,
    /// `_middleware` / `_notFound` file: only its own option object
    Scoped(OptionKind),
}

/// Per-call switches for [`TableBuilder::process`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessArgs {
    /// Match the route and everything below it
    pub wildcard: bool,
    pub role: Role,
    /// Log the file count before processing
    pub log: bool,
}

impl ProcessArgs {
    pub fn routes() -> Self {
        Self {
            wildcard: false,
            role: Role::Route,
            log: true,
        }
    }

    pub fn scoped(kind: OptionKind) -> Self {
        Self {
            wildcard: true,
            role: Role::Scoped(kind),
            log: false,
        }
    }

    fn honors(&self, kind: OptionKind) -> bool {
        match self.role {
            Role::Route => true,
            Role::Scoped(scoped) => scoped == kind,
        }
    }
}

/// Accumulates entries in registration order
///
/// # Examples
///
/// ```
/// use fsrouter::inspect::ExportedSymbols;
/// use fsrouter::table::{ProcessArgs, TableBuilder, TableSettings};
/// use fsrouter::{Method, Result};
/// use std::path::{Path, PathBuf};
///
/// let inspector = |_: &Path| -> Result<ExportedSymbols> {
///     Ok(ExportedSymbols::with_methods([Method::Get]))
/// };
/// let settings = TableSettings { root_dir: PathBuf::from("/app/src"), base_path: String::new() };
///
/// let mut builder = TableBuilder::new(settings, &inspector);
/// builder.process(&[PathBuf::from("/app/src/get.ts")], ProcessArgs::routes()).unwrap();
/// let table = builder.finish();
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.entries()[0].pattern.source(), "^/get/*$");
/// assert_eq!(table.entries()[1].method, Method::All);
/// ```
pub struct TableBuilder<'a> {
    settings: TableSettings,
    inspector: &'a dyn SourceInspector,
    entries: Vec<RouteEntry>,
}

impl<'a> TableBuilder<'a> {
    pub fn new(settings: TableSettings, inspector: &'a dyn SourceInspector) -> Self {
        if !settings.base_path.is_empty() {
            info!("Using base path: {}", settings.base_path);
        }

        Self {
            settings,
            inspector,
            entries: Vec::new(),
        }
    }

    /// Registers the entries of each file, in the order given
    ///
    /// Per file: `middleware` option keys, then method exports, then
    /// `notFound` option keys.
    ///
    /// # Errors
    ///
    /// Inspection and pattern errors; the builder is left as it was before
    /// the failing file.
    pub fn process(&mut self, paths: &[PathBuf], args: ProcessArgs) -> Result<()> {
        if args.log && !paths.is_empty() {
            let plural = if paths.len() > 1 { "s" } else { "" };
            info!("Processing {} route{}...", paths.len(), plural);
        }

        for path in paths {
            let entries = self.file_entries(path, args)?;
            self.entries.extend(entries);
        }
        Ok(())
    }

    fn file_entries(&self, path: &Path, args: ProcessArgs) -> Result<Vec<RouteEntry>> {
        let route = route_path(path, &self.settings.root_dir, &self.settings.base_path);
        let symbols = self.inspector.inspect(path)?;
        if symbols.is_empty() {
            debug!(path = %path.display(), "No handler exports");
            return Ok(Vec::new());
        }

        let pattern = if args.wildcard {
            CompiledPattern::scope(&route)?
        } else {
            CompiledPattern::compile(&route)?
        };
        let module = path.to_string_lossy().into_owned();

        let option_entries = |kind: OptionKind| {
            let keys = if args.honors(kind) {
                symbols.option(kind)
            } else {
                &[]
            };
            keys.iter()
                .map(|method| (*method, ExportPath::Option(kind, *method)))
                .collect::<Vec<_>>()
        };

        let exports = option_entries(OptionKind::Middleware)
            .into_iter()
            .chain(
                symbols
                    .methods
                    .iter()
                    .map(|method| (*method, ExportPath::Method(*method))),
            )
            .chain(option_entries(OptionKind::NotFound));

        let entries = exports
            .map(|(method, export)| {
                debug!(%method, route = %route, handler = %export, "Registered entry");
                RouteEntry::new(
                    method,
                    pattern.clone(),
                    vec![HandlerRef::export(module.clone(), export)],
                )
            })
            .collect();

        Ok(entries)
    }

    /// Runs the three category passes: middleware, routes, notFound
    pub fn process_group(&mut self, files: &ClassifiedFiles) -> Result<()> {
        if !files.config.is_empty() {
            debug!(count = files.config.len(), "Config files are not used");
        }

        self.process(&files.middleware, ProcessArgs::scoped(OptionKind::Middleware))?;
        self.process(&files.routes, ProcessArgs::routes())?;
        self.process(&files.not_found, ProcessArgs::scoped(OptionKind::NotFound))
    }

    /// Appends the universal 404 and freezes the table
    pub fn finish(mut self) -> RouteTable {
        self.entries.push(RouteEntry::universal_not_found());
        RouteTable {
            entries: self.entries,
        }
    }
}

/// Builds the complete table for classified files in one call
pub fn assemble(
    files: &ClassifiedFiles,
    inspector: &dyn SourceInspector,
    settings: TableSettings,
) -> Result<RouteTable> {
    let mut builder = TableBuilder::new(settings, inspector);
    builder.process_group(files)?;
    Ok(builder.finish())
}
