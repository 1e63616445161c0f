use crate::expression::error::FormulaError;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    /// Byte offset of the first character.
    pub(crate) at: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    /// Lowercased identifier. A leading `_` is kept, so `_pi` and `pi` stay distinct.
    Name(String),
    Open,
    Close,
    Comma,
    Question,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    End,
}

struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

pub(crate) fn lex(src: &str) -> Result<Vec<Token>, FormulaError> {
    let mut lexer = Lexer {
        src,
        chars: src.char_indices().peekable(),
    };
    let mut out = Vec::new();
    while let Some(token) = lexer.next_token()? {
        out.push(token);
    }
    out.push(Token {
        kind: TokenKind::End,
        at: src.len(),
    });
    Ok(out)
}

impl Lexer<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, FormulaError> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        let Some(&(at, c)) = self.chars.peek() else {
            return Ok(None);
        };
        let kind = if c.is_ascii_digit() || c == '.' {
            TokenKind::Number(self.number(at)?)
        } else if c.is_ascii_alphabetic() || c == '_' {
            TokenKind::Name(self.name(at))
        } else {
            self.chars.next();
            self.symbol(at, c)?
        };
        Ok(Some(Token { kind, at }))
    }

    fn end_of_run(&mut self, keep: impl Fn(char) -> bool) -> usize {
        while self.chars.next_if(|&(_, c)| keep(c)).is_some() {}
        self.chars.peek().map_or(self.src.len(), |&(i, _)| i)
    }

    fn number(&mut self, start: usize) -> Result<f64, FormulaError> {
        let mut end = self.end_of_run(|c| c.is_ascii_digit() || c == '.');
        if self.chars.next_if(|&(_, c)| c == 'e' || c == 'E').is_some() {
            self.chars.next_if(|&(_, c)| c == '+' || c == '-');
            let digits = self.chars.peek().map_or(self.src.len(), |&(i, _)| i);
            end = self.end_of_run(|c| c.is_ascii_digit());
            if end == digits {
                return Err(FormulaError::new(end, "exponent needs digits"));
            }
        }
        let text = &self.src[start..end];
        text.parse()
            .map_err(|_| FormulaError::new(start, format!("invalid number \"{text}\"")))
    }

    fn name(&mut self, start: usize) -> String {
        let end = self.end_of_run(|c| c.is_ascii_alphanumeric() || c == '_');
        self.src[start..end].to_ascii_lowercase()
    }

    fn follows(&mut self, next: char) -> bool {
        self.chars.next_if(|&(_, c)| c == next).is_some()
    }

    fn symbol(&mut self, at: usize, c: char) -> Result<TokenKind, FormulaError> {
        Ok(match c {
            '(' => TokenKind::Open,
            ')' => TokenKind::Close,
            ',' => TokenKind::Comma,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '<' if self.follows('=') => TokenKind::Le,
            '<' => TokenKind::Lt,
            '>' if self.follows('=') => TokenKind::Ge,
            '>' => TokenKind::Gt,
            '=' if self.follows('=') => TokenKind::Eq,
            '!' if self.follows('=') => TokenKind::Ne,
            '&' if self.follows('&') => TokenKind::And,
            '|' if self.follows('|') => TokenKind::Or,
            other => return Err(FormulaError::new(at, format!("unexpected character '{other}'"))),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/lexer.rs"]
mod tests;
