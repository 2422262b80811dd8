use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemError {
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("'{name}' expects {expected} argument(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("cannot assign to '{0}', which is declared as an 'in' parameter")]
    AssignToInParam(String),
    #[error("'{0}' is not a procedure or function and cannot be called")]
    NotCallable(String),
    #[error("unknown type '{0}'")]
    UnknownType(String),
}
