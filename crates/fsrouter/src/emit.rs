//! Generated JavaScript: the injectable routes module, worker entry
//! templates and the compile-time defines they read.

use crate::config::Target;
use crate::error::{Error, Result};
use crate::path::normalize_path;
use crate::table::RouteTable;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Entry for Cloudflare Workers: every request goes through the router
pub const WORKERS_TEMPLATE: &str = r#"import { Router } from 'itty-router';

const router = Router({ base: __BASE__, routes: __ROUTES__ });

export default {
	fetch: (req, env, ctx) => {
		req.ctx = Object.create(null);
		return router.handle(req, env, ctx);
	},
};
"#;

/// Entry for Cloudflare Pages: static assets short-circuit the router
pub const PAGES_TEMPLATE: &str = r#"import { Router } from 'itty-router';

const router = Router({ base: __BASE__, routes: __ROUTES__ });

export default {
	fetch: (req, env, ctx) => {
		const url = new URL(req.url);
		const pathname = __BASE__ && url.pathname.startsWith(__BASE__)
			? url.pathname.slice(__BASE__.length)
			: url.pathname;
		if (pathname in __ASSETS__) {
			return env.ASSETS.fetch(req);
		}

		req.ctx = Object.create(null);
		return router.handle(req, env, ctx);
	},
};
"#;

/// Serializes the table as `export const __ROUTES__ = [...]`
///
/// Entries keep table order; each is `[method, /pattern/, [handler, ...]]`.
///
/// # Examples
///
/// ```
/// use fsrouter::emit::routes_module;
/// use fsrouter::inspect::ExportedSymbols;
/// use fsrouter::table::{TableBuilder, TableSettings};
/// use std::path::{Path, PathBuf};
///
/// let inspector = |_: &Path| -> fsrouter::Result<ExportedSymbols> { Ok(ExportedSymbols::default()) };
/// let settings = TableSettings { root_dir: PathBuf::from("src"), base_path: String::new() };
/// let table = TableBuilder::new(settings, &inspector).finish();
///
/// assert_eq!(
///     routes_module(&table),
///     r#"export const __ROUTES__ = [["ALL", /^(.*)?\/*$/, [() => new Response("Not found", { status: 404 })]]];"#
/// );
/// ```
pub fn routes_module(table: &RouteTable) -> String {
    let entries: Vec<String> = table
        .iter()
        .map(|entry| {
            let handlers: Vec<String> = entry.handlers.iter().map(|h| h.to_js()).collect();
            format!(
                "[{}, {}, [{}]]",
                json_string(entry.method.as_str()),
                entry.pattern.to_js_literal(),
                handlers.join(",")
            )
        })
        .collect();

    format!("export const __ROUTES__ = [{}];", entries.join(","))
}

pub fn worker_template(target: Target) -> &'static str {
    match target {
        Target::Workers => WORKERS_TEMPLATE,
        Target::Pages => PAGES_TEMPLATE,
    }
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

// ============================================================================
// Assets and defines
// ============================================================================

/// `"/relative/path" → true` for every file of the public directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssetManifest(BTreeMap<String, bool>);

impl AssetManifest {
    /// Lists every file below `public_dir`
    pub fn collect(public_dir: &Path) -> Result<Self> {
        let mut assets = BTreeMap::new();

        for entry in WalkDir::new(public_dir).follow_links(true) {
            let entry = entry.map_err(|err| Error::Discovery {
                path: public_dir.to_path_buf(),
                message: err.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(public_dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .into_owned();
            assets.insert(format!("/{}", normalize_path(&relative)), true);
        }

        Ok(Self(assets))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Compile-time constants the worker template reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defines {
    pub base_path: String,
    /// Present for the `pages` target only
    pub assets: Option<AssetManifest>,
}

impl Defines {
    /// `(identifier, JavaScript expression)` pairs, `__BASE__` first
    ///
    /// ```
    /// use fsrouter::emit::{AssetManifest, Defines};
    ///
    /// let defines = Defines { base_path: "/api".into(), assets: Some(AssetManifest::default()) };
    /// assert_eq!(
    ///     defines.pairs(),
    ///     vec![("__BASE__", r#""/api""#.to_string()), ("__ASSETS__", "{}".to_string())]
    /// );
    /// ```
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("__BASE__", json_string(&self.base_path))];
        if let Some(assets) = &self.assets {
            pairs.push(("__ASSETS__", assets.to_json()));
        }
        pairs
    }
}
