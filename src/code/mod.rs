mod error;
mod lexer;
mod parse;

pub use error::DieCodeError;
pub(crate) use lexer::{Lexer, Token};
pub use parse::{DieCode, DieFaces, parse_die_code};
