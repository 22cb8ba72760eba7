use crate::code::DieCodeError;
use crate::option::OptionType;


/// Errors raised while building dice, configuring rules or rolling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("A dice set cannot contain dice with differing numbers of sides (expected {expected}, found {found})")]
    DiceMismatch {
        expected: u16,
        found: u16
    },

    #[error("An option of type {0} is already present")]
    OptionConflict(OptionType),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Die code error - {0}")]
    DieCode(#[from] DieCodeError)
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
