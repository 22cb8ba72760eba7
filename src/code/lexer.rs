use crate::code::error::*;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Number(u16),
    Dice,
    Fate,
    Eof,
}


#[derive(Debug)]
pub(crate) struct Lexer {
    input: Vec<char>,
    pub position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        if self.position >= self.input.len() {
            return Ok(Token::Eof);
        }

        let ch = self.input[self.position];

        match ch {
            'd' | 'D' => {
                self.position += 1;
                Ok(Token::Dice)
            }
            'f' | 'F' => {
                self.position += 1;
                Ok(Token::Fate)
            }
            '0'..='9' => self.read_number(),
            c if c.is_alphabetic() => Err(self.read_identifier()),
            _ => Err(DieCodeError::Token(ch))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() && self.input[self.position].is_whitespace() {
            self.position += 1;
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let start = self.position;
        while self.position < self.input.len() && self.input[self.position].is_ascii_digit() {
            self.position += 1;
        }

        let number_str: String = self.input[start..self.position].iter().collect();
        Ok(Token::Number(number_str.parse()?))
    }

    fn read_identifier(&mut self) -> DieCodeError {
        let start = self.position;
        while self.position < self.input.len() && self.input[self.position].is_alphabetic() {
            self.position += 1;
        }

        let identifier: String = self.input[start..self.position].iter().collect();
        DieCodeError::Identifier(identifier)
    }
}
