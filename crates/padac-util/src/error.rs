use thiserror::Error;

#[derive(Debug, Error)]
pub enum UtilError {
    #[error("lexicon index {0:?} out of bounds")]
    LexiconOutOfBounds(u32),
}

pub type UtilResult<T> = std::result::Result<T, UtilError>;
