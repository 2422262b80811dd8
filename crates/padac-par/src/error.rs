use thiserror::Error;

/// Parse errors. Most are recovered from (see `Parser::recover`) and only
/// reported through the `Handler`; [`ParseError::Fatal`] is the only
/// variant that aborts the whole compilation, matching spec.md §4.2's
/// "a small, explicitly listed set of conditions are fatal".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },
    #[error("missing ';'")]
    MissingSemicolon,
    #[error("closing identifier '{closing}' does not match opening '{opening}'")]
    MismatchedCloser { opening: String, closing: String },
    #[error("required program prologue not found: {0}")]
    Fatal(String),
}
