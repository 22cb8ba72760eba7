/// Syntax errors raised while reading a die code such as `3d6` or `4dF`.
///
/// Errors coming out of [`crate::parse_die_code`] are wrapped in
/// [`DieCodeError::AtPosition`]; use [`DieCodeError::err`] and
/// [`DieCodeError::pos`] to look inside.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DieCodeError {
    /// Another error, located at a character offset of the input.
    #[error("At position {0} - {1}")]
    AtPosition(usize, Box<DieCodeError>),

    /// A character that cannot start any token.
    #[error("Invalid token: {0}")]
    Token(char),

    /// A number that does not fit a `u16`.
    #[error("Invalid number: {0}")]
    Number(#[from] std::num::ParseIntError),

    /// A word other than `d` or `F`.
    #[error("Invalid identifier: {0}")]
    Identifier(String),

    /// A token the grammar does not allow at that point.
    #[error("Unexpected {0}")]
    Unexpected(String),

    /// The input holds nothing but whitespace.
    #[error("Input string is empty")]
    Empty,

    /// A well formed code for a kind of dice the reader does not handle.
    #[error("Unrecognized die code: {0}")]
    Unrecognized(String)
}

impl DieCodeError {
    /// The error without its position.
    pub fn err(&self) -> &Self {
        match self {
            DieCodeError::AtPosition(_, err) => err.as_ref(),
            other => other
        }
    }

    /// The character offset the error was found at, if known.
    pub fn pos(&self) -> Option<usize> {
        match self {
            DieCodeError::AtPosition(position, _) => Some(*position),
            _ => None
        }
    }

    /// Attaches `position` unless a position is already known.
    pub fn at_pos(self, position: usize) -> Self {
        match self {
            DieCodeError::AtPosition(_, _) => self,
            other => DieCodeError::AtPosition(position, Box::new(other))
        }
    }
}

pub(crate) type Result<T> = std::result::Result<T, DieCodeError>;
