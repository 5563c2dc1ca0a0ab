//! Route path compilation
//!
//! - [`syntax`]: bracket file names → colon syntax
//! - [`pattern`]: colon syntax → anchored matcher

pub mod pattern;
pub mod syntax;

pub use pattern::CompiledPattern;
pub use syntax::transform_syntax;
