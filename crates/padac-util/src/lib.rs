//! padac-util — Core Utilities and Foundation Types
//!
//! Shared plumbing for every phase of the padac pipeline: string interning
//! (`Symbol`/`StringTable`), the separate literal Lexicon, the typed index
//! pattern (`Idx`/`IndexVec`/`define_idx!`), source spans, and the
//! diagnostic collector. Nothing here is specific to any one phase; this
//! crate exists so `padac-lex`, `padac-par`, `padac-sem` and `padac-gen`
//! never have to agree informally on "what a node id looks like".

pub mod diag;
pub mod error;
pub mod index;
pub mod lexicon;
pub mod span;
pub mod symbol;

pub use diag::{Diagnostic, Handler, Level};
pub use error::{UtilError, UtilResult};
pub use index::{Counter, Idx, IndexVec};
pub use lexicon::{Lexicon, LexiconIndex};
pub use span::{Pos, Span};
pub use symbol::{StringTable, Symbol};
