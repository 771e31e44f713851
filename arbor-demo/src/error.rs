use std::num::ParseIntError;

#[derive(Debug, thiserror::Error)]
pub enum DepthError {
    #[error("expected a number of commits ({0})")]
    NotANumber(#[from] ParseIntError),

    #[error("a shallow clone needs at least one commit")]
    Zero,
}
