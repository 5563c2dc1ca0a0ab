//! Export discovery for route modules
//!
//! The compiler never executes route code. A [`SourceInspector`] reports
//! which names a module exports, and for the `middleware` / `notFound`
//! option objects, which method keys they carry. [`StaticInspector`] parses
//! the module with `oxc_parser` and reads its top-level exports.

use crate::error::{Error, Result};
use crate::method::Method;
use crate::path::{is_module_file, MODULE_EXTENSIONS};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPattern, Declaration, ExportAllDeclaration, ExportNamedDeclaration, Expression,
    ImportDeclaration, ImportDeclarationSpecifier, ModuleExportName, ObjectExpression,
    ObjectPropertyKind, PropertyKey, Statement, VariableDeclaration,
};
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

// ============================================================================
// Exported symbols
// ============================================================================

/// Option objects a module may export next to its method handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionKind {
    Middleware,
    NotFound,
}

impl OptionKind {
    pub const VARIANTS: [OptionKind; 2] = [OptionKind::Middleware, OptionKind::NotFound];

    /// Export name of the option object
    pub fn export_name(&self) -> &'static str {
        match self {
            OptionKind::Middleware => "middleware",
            OptionKind::NotFound => "notFound",
        }
    }

    fn from_export_name(name: &str) -> Option<Self> {
        Self::VARIANTS
            .into_iter()
            .find(|kind| kind.export_name() == name)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.export_name())
    }
}

/// What a route module exports, as far as routing is concerned
///
/// Both lists keep declaration order and hold each method once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedSymbols {
    pub methods: Vec<Method>,
    pub options: BTreeMap<OptionKind, Vec<Method>>,
}

impl ExportedSymbols {
    /// Symbols with the given method exports and no option objects
    ///
    /// ```
    /// use fsrouter::inspect::{ExportedSymbols, OptionKind};
    /// use fsrouter::Method;
    ///
    /// let symbols = ExportedSymbols::with_methods([Method::Get, Method::Post, Method::Get])
    ///     .with_option(OptionKind::NotFound, [Method::Post]);
    /// assert_eq!(symbols.methods, vec![Method::Get, Method::Post]);
    /// assert_eq!(symbols.option(OptionKind::NotFound), &[Method::Post]);
    /// assert!(symbols.option(OptionKind::Middleware).is_empty());
    /// ```
    pub fn with_methods(methods: impl IntoIterator<Item = Method>) -> Self {
        let mut symbols = Self::default();
        for method in methods {
            symbols.push_method(method);
        }
        symbols
    }

    pub fn with_option(mut self, kind: OptionKind, keys: impl IntoIterator<Item = Method>) -> Self {
        for key in keys {
            self.push_option(kind, key);
        }
        self
    }

    /// Method keys of an option object, empty when it is not exported
    pub fn option(&self, kind: OptionKind) -> &[Method] {
        self.options.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.options.values().all(Vec::is_empty)
    }

    fn push_method(&mut self, method: Method) {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
    }

    fn push_option(&mut self, kind: OptionKind, method: Method) {
        let keys = self.options.entry(kind).or_default();
        if !keys.contains(&method) {
            keys.push(method);
        }
    }
}

// ============================================================================
// Inspector trait
// ============================================================================

/// Reports the exports of a route module
pub trait SourceInspector {
    /// # Errors
    ///
    /// `Error::Inspect` naming the file when its exports cannot be determined.
    fn inspect(&self, path: &Path) -> Result<ExportedSymbols>;
}

impl<F> SourceInspector for F
where
    F: Fn(&Path) -> Result<ExportedSymbols>,
{
    fn inspect(&self, path: &Path) -> Result<ExportedSymbols> {
        self(path)
    }
}

/// Parses route modules and reads their top-level export declarations
///
/// Recognized forms:
///
/// - `export const|let|var A = …, B = …`, destructuring included
/// - `export [async] function[*] NAME`, `export class NAME`
/// - `export { A, B as C }` and `export { … } from "./module"`
/// - `export * from "./module"`
/// - for `middleware` / `notFound`: the keys of the object literal they are
///   bound to, followed through local bindings, imports and re-exports of
///   relative modules
///
/// Default exports and type-only exports are ignored.
///
/// # Examples
///
/// ```
/// use fsrouter::inspect::{OptionKind, StaticInspector};
/// use fsrouter::Method;
/// use std::path::Path;
///
/// let source = r#"
///     export const GET = () => new Response("hi");
///     export const notFound = { POST: () => new Response("nope", { status: 404 }) };
/// "#;
///
/// let symbols = StaticInspector::new().scan(Path::new("a.ts"), source).unwrap();
/// assert_eq!(symbols.methods, vec![Method::Get]);
/// assert_eq!(symbols.option(OptionKind::NotFound), &[Method::Post]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticInspector;

impl StaticInspector {
    pub fn new() -> Self {
        Self
    }

    /// Inspects already-loaded source
    ///
    /// `path` labels errors and anchors relative re-exports.
    pub fn scan(&self, path: &Path, source: &str) -> Result<ExportedSymbols> {
        let module = ParsedModule::parse(path, source)?;
        let mut graph = ModuleGraph {
            stack: vec![canonical(path)],
        };
        let exports = graph.exports_of(path, &module)?;

        let mut symbols = ExportedSymbols::default();
        for export in exports {
            if let Ok(method) = export.name.parse::<Method>() {
                symbols.push_method(method);
                continue;
            }

            let Some(kind) = OptionKind::from_export_name(&export.name) else {
                continue;
            };

            match graph.keys(&export.module, &export.value)? {
                Some(keys) => {
                    for method in keys.iter().filter_map(|key| key.parse::<Method>().ok()) {
                        symbols.push_option(kind, method);
                    }
                }
                None => warn!(
                    path = %path.display(),
                    "`{}` export is not an object literal; its keys are ignored",
                    kind
                ),
            }
        }

        Ok(symbols)
    }
}

impl SourceInspector for StaticInspector {
    fn inspect(&self, path: &Path) -> Result<ExportedSymbols> {
        self.scan(path, &read_source(path)?)
    }
}

fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|err| Error::inspect(path, err.to_string()))?;
    String::from_utf8(bytes).map_err(|_| Error::inspect(path, "file is not valid UTF-8"))
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

// ============================================================================
// Module parsing
// ============================================================================

/// What a binding holds, as far as option keys are concerned
#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    /// Object literal with these static keys
    Object(Vec<String>),
    /// Another binding of the same module
    Local(String),
    /// Export `name` of the module at `source`
    Import { source: String, name: String },
    Opaque,
}

/// Owned summary of one module, independent of the parser's arena
#[derive(Debug, Default)]
struct ParsedModule {
    /// Exported name and binding, in declaration order
    exports: Vec<(String, Binding)>,
    /// Sources of `export * from "…"`
    stars: Vec<String>,
    locals: HashMap<String, Binding>,
}

impl ParsedModule {
    fn parse(path: &Path, source: &str) -> Result<Self> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(path)
            .unwrap_or_else(|_| SourceType::default().with_typescript(true))
            .with_module(true);

        let ret = Parser::new(&allocator, source, source_type).parse();
        if let Some(error) = ret.errors.first() {
            return Err(Error::inspect(path, error.to_string()));
        }

        let mut module = Self::default();
        for stmt in &ret.program.body {
            match stmt {
                Statement::ImportDeclaration(import) => module.import(import),
                Statement::VariableDeclaration(decl) => {
                    module.declare(decl);
                }
                Statement::ExportNamedDeclaration(export) => module.export_named(export),
                Statement::ExportAllDeclaration(export) => module.export_all(export),
                _ => {}
            }
        }

        module.settle();
        Ok(module)
    }

    fn import(&mut self, import: &ImportDeclaration) {
        if import.import_kind.is_type() {
            return;
        }
        let Some(specifiers) = &import.specifiers else {
            return;
        };

        for specifier in specifiers {
            if let ImportDeclarationSpecifier::ImportSpecifier(s) = specifier {
                if s.import_kind.is_type() {
                    continue;
                }
                self.locals.insert(
                    s.local.name.to_string(),
                    Binding::Import {
                        source: import.source.value.to_string(),
                        name: export_name(&s.imported),
                    },
                );
            }
        }
    }

    /// Records the bindings of a declaration and returns their names
    fn declare(&mut self, decl: &VariableDeclaration) -> Vec<String> {
        let mut declared = Vec::new();

        for declarator in &decl.declarations {
            if let BindingPattern::BindingIdentifier(id) = &declarator.id {
                let binding = declarator
                    .init
                    .as_ref()
                    .map(binding_of)
                    .unwrap_or(Binding::Opaque);
                self.locals.insert(id.name.to_string(), binding);
                declared.push(id.name.to_string());
            } else {
                let mut names = Vec::new();
                binding_names(&declarator.id, &mut names);
                for name in names {
                    self.locals.insert(name.clone(), Binding::Opaque);
                    declared.push(name);
                }
            }
        }

        declared
    }

    fn export_named(&mut self, export: &ExportNamedDeclaration) {
        if export.export_kind.is_type() {
            return;
        }

        match &export.declaration {
            Some(Declaration::VariableDeclaration(decl)) => {
                for name in self.declare(decl) {
                    self.exports.push((name.clone(), Binding::Local(name)));
                }
            }
            Some(Declaration::FunctionDeclaration(function)) => {
                if let Some(id) = &function.id {
                    self.exports.push((id.name.to_string(), Binding::Opaque));
                }
            }
            Some(Declaration::ClassDeclaration(class)) => {
                if let Some(id) = &class.id {
                    self.exports.push((id.name.to_string(), Binding::Opaque));
                }
            }
            _ => {}
        }

        let source = export.source.as_ref().map(|s| s.value.to_string());
        for specifier in &export.specifiers {
            if specifier.export_kind.is_type() {
                continue;
            }
            let local = export_name(&specifier.local);
            let binding = match &source {
                Some(source) => Binding::Import {
                    source: source.clone(),
                    name: local,
                },
                None => Binding::Local(local),
            };
            self.exports.push((export_name(&specifier.exported), binding));
        }
    }

    fn export_all(&mut self, export: &ExportAllDeclaration) {
        if export.export_kind.is_type() {
            return;
        }
        match &export.exported {
            Some(name) => self.exports.push((export_name(name), Binding::Opaque)),
            None => self.stars.push(export.source.value.to_string()),
        }
    }

    /// Replaces local aliases in exports with what they finally refer to
    fn settle(&mut self) {
        let settled: Vec<(String, Binding)> = self
            .exports
            .iter()
            .map(|(name, binding)| (name.clone(), self.follow(binding)))
            .collect();
        self.exports = settled;
    }

    fn follow(&self, binding: &Binding) -> Binding {
        let mut current = binding;
        for _ in 0..=self.locals.len() {
            match current {
                Binding::Local(name) => match self.locals.get(name) {
                    Some(next) => current = next,
                    None => return Binding::Opaque,
                },
                other => return other.clone(),
            }
        }
        Binding::Opaque
    }
}

fn binding_of(expr: &Expression) -> Binding {
    match strip_type_wrappers(expr) {
        Expression::ObjectExpression(object) => Binding::Object(object_keys(object)),
        Expression::Identifier(id) => Binding::Local(id.name.to_string()),
        _ => Binding::Opaque,
    }
}

/// `(x)`, `x as T`, `x satisfies T`, `x!` and `<T>x` all evaluate to `x`
fn strip_type_wrappers<'b, 'a>(expr: &'b Expression<'a>) -> &'b Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(e) => strip_type_wrappers(&e.expression),
        Expression::TSAsExpression(e) => strip_type_wrappers(&e.expression),
        Expression::TSSatisfiesExpression(e) => strip_type_wrappers(&e.expression),
        Expression::TSNonNullExpression(e) => strip_type_wrappers(&e.expression),
        Expression::TSTypeAssertion(e) => strip_type_wrappers(&e.expression),
        other => other,
    }
}

/// Static keys of an object literal; spreads and computed keys are skipped
fn object_keys(object: &ObjectExpression) -> Vec<String> {
    object
        .properties
        .iter()
        .filter_map(|property| match property {
            ObjectPropertyKind::ObjectProperty(p) if !p.computed => match &p.key {
                PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
                PropertyKey::StringLiteral(s) => Some(s.value.to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

fn binding_names(pattern: &BindingPattern, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => names.push(id.name.to_string()),
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                binding_names(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                binding_names(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for pattern in arr.elements.iter().flatten() {
                binding_names(pattern, names);
            }
            if let Some(rest) = &arr.rest {
                binding_names(&rest.argument, names);
            }
        }
        BindingPattern::AssignmentPattern(assign) => binding_names(&assign.left, names),
    }
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(s) => s.value.to_string(),
    }
}

// ============================================================================
// Cross-module resolution
// ============================================================================

/// An export together with the module that declares it
#[derive(Debug, Clone)]
struct ModuleExport {
    name: String,
    module: PathBuf,
    value: Binding,
}

/// Follows relative re-exports and imports; `stack` holds the modules being
/// expanded so cycles end instead of recursing
struct ModuleGraph {
    stack: Vec<PathBuf>,
}

impl ModuleGraph {
    /// Exports of `module`, star re-exports included; explicit exports win
    fn exports_of(&mut self, path: &Path, module: &ParsedModule) -> Result<Vec<ModuleExport>> {
        let mut exports: Vec<ModuleExport> = module
            .exports
            .iter()
            .map(|(name, value)| ModuleExport {
                name: name.clone(),
                module: path.to_path_buf(),
                value: value.clone(),
            })
            .collect();

        for source in &module.stars {
            let Some(target) = resolve_specifier(path, source) else {
                warn!(path = %path.display(), "cannot follow `export * from \"{}\"`", source);
                continue;
            };
            let starred = self.within(&target, |graph, parsed| graph.exports_of(&target, parsed))?;
            for export in starred.unwrap_or_default() {
                if !exports.iter().any(|existing| existing.name == export.name) {
                    exports.push(export);
                }
            }
        }

        Ok(exports)
    }

    /// Object keys a binding of the module at `path` resolves to
    fn keys(&mut self, path: &Path, value: &Binding) -> Result<Option<Vec<String>>> {
        match value {
            Binding::Object(keys) => Ok(Some(keys.clone())),
            Binding::Import { source, name } => {
                let Some(target) = resolve_specifier(path, source) else {
                    return Ok(None);
                };
                let found = self.within(&target, |graph, parsed| {
                    let exports = graph.exports_of(&target, parsed)?;
                    match exports.into_iter().find(|export| &export.name == name) {
                        Some(export) => graph.keys(&export.module, &export.value),
                        None => Ok(None),
                    }
                })?;
                Ok(found.flatten())
            }
            Binding::Local(_) | Binding::Opaque => Ok(None),
        }
    }

    /// Parses `target` and runs `f` on it, unless it is already being expanded
    fn within<T>(
        &mut self,
        target: &Path,
        f: impl FnOnce(&mut Self, &ParsedModule) -> Result<T>,
    ) -> Result<Option<T>> {
        if self.stack.iter().any(|open| open == target) {
            return Ok(None);
        }

        let parsed = ParsedModule::parse(target, &read_source(target)?)?;
        self.stack.push(target.to_path_buf());
        let result = f(self, &parsed);
        self.stack.pop();
        result.map(Some)
    }
}

/// Module file a relative specifier (`./shared`, `../lib/options.ts`) points to
fn resolve_specifier(from: &Path, specifier: &str) -> Option<PathBuf> {
    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return None;
    }

    let base = from.parent().unwrap_or(Path::new("")).join(specifier);
    let mut candidates = vec![base.clone()];
    for ext in MODULE_EXTENSIONS {
        let mut with_ext = base.clone().into_os_string();
        with_ext.push(format!(".{}", ext));
        candidates.push(PathBuf::from(with_ext));
    }
    for ext in MODULE_EXTENSIONS {
        candidates.push(base.join(format!("index.{}", ext)));
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.is_file() && is_module_file(candidate))
        .map(|found| canonical(&found))
}
