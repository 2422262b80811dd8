//! padac-sem — Symbol & Scope Resolution
//!
//! Walks the AST `padac-par` produces, building the nested scope tree,
//! symbol tables, and frame offsets `padac-gen` needs to emit static-link
//! traversals and stack-relative addressing, and reporting the semantic
//! diagnostics SPEC_FULL.md §4.3 adds on top of the distilled spec
//! (unknown identifiers, arity mismatches, writes to `in`-only
//! parameters).

pub mod error;
pub mod resolver;
pub mod scope;

pub use error::SemError;
pub use resolver::{resolve, Resolution};
pub use scope::{Param, RegionId, Scope, ScopeTree, Sym, SymbolId, TypeName};
