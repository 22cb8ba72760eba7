use std::{fmt::Display, str::FromStr};
use crate::code::error::*;
use crate::code::{Lexer, Token};


/// What a die code says about the faces of its dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DieFaces {
    /// Standard dice with this many sides.
    Sides(u16),
    /// Fate dice.
    Fate
}


/// A parsed die code: `[quantity]d(faces|F)`.
///
/// Parsing only checks the syntax. A quantity of `0` or a `d1` parse fine
/// and are rejected later, when a [`crate::DiceFactory`] builds the dice.
///
/// # Examples
/// ```
/// use diceforge::{DieCode, DieFaces};
///
/// let code: DieCode = "3d6".parse().unwrap();
/// assert_eq!((code.quantity(), code.faces()), (3, Some(6)));
///
/// let code: DieCode = "d20".parse().unwrap();
/// assert_eq!(code.quantity(), 1);
///
/// let code: DieCode = "4dF".parse().unwrap();
/// assert_eq!(code.kind(), DieFaces::Fate);
/// assert_eq!(code.to_string(), "4dF");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DieCode {
    quantity: u16,
    faces: DieFaces
}

impl DieCode {
    /// Builds a code from its parts.
    pub fn new(quantity: u16, faces: DieFaces) -> Self {
        Self { quantity, faces }
    }

    /// Number of dice.
    pub fn quantity(&self) -> u16 {
        self.quantity
    }

    /// The faces part of the code.
    pub fn kind(&self) -> DieFaces {
        self.faces
    }

    /// Side count of standard dice, `None` for Fate dice.
    pub fn faces(&self) -> Option<u16> {
        match self.faces {
            DieFaces::Sides(sides) => Some(sides),
            DieFaces::Fate => None
        }
    }

    /// Shortcut for `kind() == DieFaces::Fate`.
    pub fn is_fate(&self) -> bool {
        self.faces == DieFaces::Fate
    }
}

impl Display for DieCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.faces {
            DieFaces::Sides(sides) => write!(f, "{}d{}", self.quantity, sides),
            DieFaces::Fate => write!(f, "{}dF", self.quantity)
        }
    }
}

impl FromStr for DieCode {
    type Err = DieCodeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_die_code(s)
    }
}


#[derive(Debug)]
struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token
}

impl Parser {
    fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token().map_err(|err| err.at_pos(lexer.position))?;

        if current == Token::Eof {
            return Err(DieCodeError::Empty);
        }

        let peek = lexer.next_token().map_err(|err| err.at_pos(lexer.position))?;
        Ok(Self { lexer, current, peek })
    }

    fn next_token(&mut self) -> Result<()> {
        self.current = self.peek;
        self.peek = self.lexer.next_token()?;

        Ok(())
    }

    fn parse(&mut self) -> Result<DieCode> {
        self.parse_code()
            .map_err(|err| err.at_pos(self.lexer.position))
    }

    fn parse_code(&mut self) -> Result<DieCode> {
        let quantity = match self.current {
            Token::Number(quantity) => {
                self.next_token()?;
                quantity
            },
            _ => 1
        };

        if self.current != Token::Dice {
            return Err(unexpected(self.current, "'d'"));
        }

        self.next_token()?;

        let faces = match self.current {
            Token::Number(sides) => DieFaces::Sides(sides),
            Token::Fate => DieFaces::Fate,
            other => return Err(unexpected(other, "a number of faces or 'F'"))
        };

        if self.peek != Token::Eof {
            return Err(unexpected(self.peek, "end of input"));
        }

        Ok(DieCode { quantity, faces })
    }
}

fn unexpected(token: Token, expected: &str) -> DieCodeError {
    let found = match token {
        Token::Number(n) => format!("number {n}"),
        Token::Dice => "'d'".into(),
        Token::Fate => "'F'".into(),
        Token::Eof => "end of input".into()
    };

    DieCodeError::Unexpected(format!("{found}, expected {expected}"))
}


/// Parses a die code such as `3d6`, `d20` or `4dF`.
///
/// Letters are case-insensitive and whitespace around tokens is ignored.
/// The quantity defaults to 1.
///
/// # Errors
/// Returns a [`DieCodeError`] for malformed input, wrapped with positional
/// information through [`DieCodeError::at_pos`] except for [`DieCodeError::Empty`].
///
/// # Examples
/// ```
/// use diceforge::{parse_die_code, DieCodeError};
///
/// let code = parse_die_code(" 2D10 ").unwrap();
/// assert_eq!(code.to_string(), "2d10");
///
/// let err = parse_die_code("abc").unwrap_err();
/// assert!(matches!(err.err(), DieCodeError::Identifier(_)));
/// assert_eq!(err.pos(), Some(3));
/// ```
pub fn parse_die_code(input: &str) -> std::result::Result<DieCode, DieCodeError> {
    Parser::new(input)?.parse()
}


#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use super::*;


    proptest! {
        #[test]
        fn test_standard_codes(quantity in 0u16..=1000, sides in 0u16..=1000, upper: bool) {
            let d = if upper { "D" } else { "d" };
            let code = parse_die_code(&format!("{quantity}{d}{sides}")).unwrap();

            prop_assert_eq!(code, DieCode::new(quantity, DieFaces::Sides(sides)));
            prop_assert_eq!(code.to_string(), format!("{quantity}d{sides}"));
        }

        #[test]
        fn test_fate_codes(quantity in 1u16..=1000, f in "[fF]") {
            let code = parse_die_code(&format!("{quantity}d{f}")).unwrap();

            prop_assert!(code.is_fate());
            prop_assert_eq!(code.faces(), None);
            prop_assert_eq!(code.quantity(), quantity);
        }

        #[test]
        fn test_display_parses_back(quantity in 0u16..=1000, faces in prop_oneof![
            (0u16..=1000).prop_map(DieFaces::Sides),
            Just(DieFaces::Fate)
        ]) {
            let code = DieCode::new(quantity, faces);
            prop_assert_eq!(code.to_string().parse::<DieCode>().unwrap(), code);
        }
    }

    #[test]
    fn test_examples() {
        assert_eq!(parse_die_code("3d6").unwrap(), DieCode::new(3, DieFaces::Sides(6)));
        assert_eq!(parse_die_code("4dF").unwrap(), DieCode::new(4, DieFaces::Fate));
        assert_eq!(parse_die_code("d20").unwrap(), DieCode::new(1, DieFaces::Sides(20)));
    }

    #[test]
    fn test_malformed_codes() {
        assert_eq!(parse_die_code("   "), Err(DieCodeError::Empty));

        let err = parse_die_code("abc").unwrap_err();
        assert!(matches!(err.err(), DieCodeError::Identifier(id) if id == "abc"));

        let err = parse_die_code("3d").unwrap_err();
        assert!(matches!(err.err(), DieCodeError::Unexpected(_)));

        let err = parse_die_code("3d6d6").unwrap_err();
        assert!(matches!(err.err(), DieCodeError::Unexpected(_)));
        assert!(err.pos().is_some());

        let err = parse_die_code("3x6").unwrap_err();
        assert!(matches!(err.err(), DieCodeError::Identifier(_)));

        let err = parse_die_code("3d6+1").unwrap_err();
        assert!(matches!(err.err(), DieCodeError::Token('+')));

        let err = parse_die_code("6").unwrap_err();
        assert!(matches!(err.err(), DieCodeError::Unexpected(_)));

        let err = parse_die_code("d99999").unwrap_err();
        assert!(matches!(err.err(), DieCodeError::Number(_)));
    }
}
