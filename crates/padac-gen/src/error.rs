use thiserror::Error;

/// Codegen errors. The resolver already validates every name, arity and
/// write target, so these only cover shapes codegen itself cannot make
/// sense of — an unresolved field name on an otherwise-valid record access,
/// or a call target whose symbol is not actually callable despite having
/// passed resolution (which would itself be a resolver bug).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("record type has no field named '{0}'")]
    UnknownField(String),
    #[error("internal error: {0}")]
    Internal(String),
}
