use thiserror::Error;

/// Lexical errors. Every variant here is non-fatal: the lexer reports it
/// to the [`padac_util::Handler`] and keeps scanning, matching spec.md's
/// requirement that lexical errors never abort compilation on their own
/// (unlike the original Go lexer, which `panic!`s on most of these —
/// see DESIGN.md).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unterminated character literal")]
    UnterminatedCharLiteral,
    #[error("unexpected end of file in string literal")]
    UnterminatedStringLiteral,
    #[error("empty character literal")]
    EmptyCharLiteral,
}
