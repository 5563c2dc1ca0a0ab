//! # fsrouter
//!
//! Compiles a directory of route files into one ordered dispatch table for
//! an edge worker:
//! - Routes by file location (`src/users/[id].ts` → `/users/:id`)
//! - Optional (`[[name]]`), greedy (`[...name]`) and wildcard (`[...]`) segments
//! - Directory-scoped `_middleware` and `_notFound` files
//! - A universal `404 Not found` as the last entry
//!
//! ## Precedence
//!
//! The table is the precedence order. Files are walked deepest first and
//! registered in three passes (middleware, routes, notFound), so a nested
//! middleware runs before a shallower one and a nested notFound answers
//! before the root one.
//!
//! ## Example
//!
//! ```
//! use fsrouter::inspect::ExportedSymbols;
//! use fsrouter::table::{ProcessArgs, TableBuilder, TableSettings};
//! use fsrouter::{Method, Result};
//! use std::path::{Path, PathBuf};
//!
//! let inspector = |_: &Path| -> Result<ExportedSymbols> {
//!     Ok(ExportedSymbols::with_methods([Method::Get]))
//! };
//! let settings = TableSettings { root_dir: PathBuf::from("src"), base_path: String::new() };
//!
//! let mut builder = TableBuilder::new(settings, &inspector);
//! builder.process(&[PathBuf::from("src/users/[id].ts")], ProcessArgs::routes())?;
//! let table = builder.finish();
//!
//! let params = table.entries()[0].pattern.captures("/users/123").unwrap();
//! assert_eq!(params.get("id"), Some(&"123".to_string()));
//! # Ok::<(), fsrouter::Error>(())
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod build;
pub mod bundle;
pub mod config;
pub mod discover;
pub mod dispatch;
pub mod emit;
mod error;
pub mod inspect;
mod method;
pub mod path;
pub mod route;
pub mod table;

pub use build::{build, compile_table, BuildReport};
pub use config::{Config, ResolvedConfig, Target};
pub use error::{Error, Result};
pub use method::Method;
pub use route::CompiledPattern;
pub use table::{RouteEntry, RouteTable};
