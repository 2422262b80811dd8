//! padac-gen — ARM Assembly Code Generation
//!
//! Walks the resolved AST (`padac-par`'s [`Ast`](padac_par::Ast) plus
//! `padac-sem`'s [`Resolution`](padac_sem::Resolution)) and emits a single
//! ARM-style assembly listing: a textual activation-record discipline with
//! a frame-pointer chain (`R11`) doubling as the static link for nested
//! procedures, a two-buffer emission scheme so nested procedure bodies can
//! be appended after the top-level `end` label without a post-pass, and a
//! small fixed set of runtime subroutines (`mul`, `div32`, `fix_sign`,
//! `println`, `to_ascii`) appended verbatim.
//!
//! Grounded line-for-line on
//! `examples/original_source/parser/asm.go` (`ReadFile`, `ReadBody`,
//! `ReadIf`, `ReadWhile`, `ReadFor`, `ReadOperand`, `ReadVar`, `ReadDecl`,
//! `ReadProcedure`, `Call`, `CallWithParameters`, and the static-link
//! search loop inlined at every variable reference).

pub mod buffer;
pub mod codegen;
pub mod error;
pub mod runtime;

pub use buffer::{AssemblyBuffer, BufferMode, Cond, Reg};
pub use codegen::Codegen;
pub use error::GenError;

use padac_par::Ast;
use padac_sem::Resolution;
use padac_util::Lexicon;

/// Generates a complete assembly listing for `ast`, consulting `res` for
/// scope/symbol information and `lexicon` for literal spellings.
pub fn generate(ast: &Ast, res: &Resolution, lexicon: &Lexicon) -> Result<String, GenError> {
    Codegen::new(ast, res, lexicon).generate()
}

#[cfg(test)]
mod tests;
