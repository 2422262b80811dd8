//! padac-lex — Lexical Analysis
//!
//! Turns source text into a flat [`Token`] stream plus a [`Lexicon`] of
//! literal spellings. One reserved-word table, one operator/separator
//! table, UTF-8-aware line/column tracking, and non-fatal error recovery
//! (an unrecognized character or an unterminated literal is reported and
//! skipped, never a hard stop — only the parser's prologue check can abort
//! a compilation outright, per spec.md §4.2).

mod cursor;
mod error;
mod lexer;
mod token;

pub use error::LexError;
pub use lexer::Lexer;
pub use token::{OpCode, Token, TokenKind};
