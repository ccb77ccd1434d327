//! Single-pass lexer turning source text into a flat token stream.
//!
//! The stream always ends with a [`TokenKind::End`] sentinel. Tokens carry
//! the location of their first character; columns increase monotonically
//! within a line and reset at every newline.

use std::fmt;

use crate::error::{CodeLoc, Exception};

/// The kind of a token. Payloads (the number value, the identifier or string
/// text) live on [`Token`] itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    End,
    Number,
    Str,
    Ident,

    // keywords
    Fn,
    If,
    Else,
    While,
    For,
    Return,
    Print,
    Array,

    // punctuators
    Dot,
    Comma,
    Semicolon,
    Assign,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Eq,
    NotEq,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::End => "end of input",
            Self::Number => "number",
            Self::Str => "string",
            Self::Ident => "identifier",
            Self::Fn => "`fn`",
            Self::If => "`if`",
            Self::Else => "`else`",
            Self::While => "`while`",
            Self::For => "`for`",
            Self::Return => "`return`",
            Self::Print => "`print`",
            Self::Array => "`array`",
            Self::Dot => "`.`",
            Self::Comma => "`,`",
            Self::Semicolon => "`;`",
            Self::Assign => "`=`",
            Self::Less => "`<`",
            Self::Greater => "`>`",
            Self::LessEq => "`<=`",
            Self::GreaterEq => "`>=`",
            Self::Eq => "`==`",
            Self::NotEq => "`!=`",
            Self::Not => "`!`",
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::Star => "`*`",
            Self::Slash => "`/`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
        };
        f.write_str(text)
    }
}

impl TokenKind {
    /// The source spelling of keyword and punctuator tokens.
    fn fixed_lexeme(self) -> Option<&'static str> {
        let lexeme = match self {
            Self::Fn => "fn",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::For => "for",
            Self::Return => "return",
            Self::Print => "print",
            Self::Array => "array",
            Self::Dot => ".",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Assign => "=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEq => "<=",
            Self::GreaterEq => ">=",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Not => "!",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::End | Self::Number | Self::Str | Self::Ident => return None,
        };
        Some(lexeme)
    }
}

/// A single token with its payload and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The number associated with this token, if any.
    pub number: f32,
    /// The text associated with this token (identifiers and string literals).
    pub text: String,
    pub location: CodeLoc,
}

impl Token {
    fn new(kind: TokenKind, location: CodeLoc) -> Self {
        Self {
            kind,
            number: 0.0,
            text: String::new(),
            location,
        }
    }

    fn with_number(number: f32, location: CodeLoc) -> Self {
        Self {
            kind: TokenKind::Number,
            number,
            text: String::new(),
            location,
        }
    }

    fn with_text(kind: TokenKind, text: String, location: CodeLoc) -> Self {
        Self {
            kind,
            number: 0.0,
            text,
            location,
        }
    }
}

impl fmt::Display for Token {
    /// Renders the token back to a source spelling that lexes to the same
    /// token again.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::End => Ok(()),
            TokenKind::Number => write!(f, "{}", self.number),
            TokenKind::Str => write!(f, "\"{}\"", self.text),
            TokenKind::Ident => f.write_str(&self.text),
            kind => f.write_str(kind.fixed_lexeme().unwrap_or("")),
        }
    }
}

/// Tokenizes the whole source buffer, ending with the [`TokenKind::End`]
/// sentinel. Fails on the first byte that cannot start any token.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, Exception> {
    let mut lexer = Lexer {
        source,
        pos: 0,
        line: 1,
        column: 0,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::End;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer<'_> {
    /// Byte at `offset` from the current position, `0` past the end.
    fn peek(&self, offset: usize) -> u8 {
        self.source.as_bytes().get(self.pos + offset).copied().unwrap_or(0)
    }

    fn bump(&mut self) {
        if self.peek(0) == b'\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        self.pos += 1;
    }

    fn loc(&self) -> CodeLoc {
        CodeLoc::new(self.line, self.column)
    }

    fn skip_whitespace(&mut self) {
        while self.peek(0).is_ascii_whitespace() {
            self.bump();
        }
    }

    fn next_token(&mut self) -> Result<Token, Exception> {
        self.skip_whitespace();
        // `//` comments run to the end of the line.
        while self.peek(0) == b'/' && self.peek(1) == b'/' {
            while self.peek(0) != 0 && self.peek(0) != b'\n' {
                self.bump();
            }
            self.skip_whitespace();
        }

        let location = self.loc();
        let byte = self.peek(0);
        if byte == 0 {
            return Ok(Token::new(TokenKind::End, location));
        }
        if byte.is_ascii_alphabetic() || byte == b'_' {
            return Ok(self.lex_word(location));
        }
        if byte == b'"' {
            return self.lex_string(location);
        }

        // Two-character operators take priority over their one-character prefixes.
        let two_char = match (byte, self.peek(1)) {
            (b'=', b'=') => Some(TokenKind::Eq),
            (b'!', b'=') => Some(TokenKind::NotEq),
            (b'<', b'=') => Some(TokenKind::LessEq),
            (b'>', b'=') => Some(TokenKind::GreaterEq),
            _ => None,
        };
        if let Some(kind) = two_char {
            self.bump();
            self.bump();
            return Ok(Token::new(kind, location));
        }

        let single_char = match byte {
            b'=' => Some(TokenKind::Assign),
            b'<' => Some(TokenKind::Less),
            b'>' => Some(TokenKind::Greater),
            b'!' => Some(TokenKind::Not),
            b'+' => Some(TokenKind::Plus),
            b'-' => Some(TokenKind::Minus),
            b'*' => Some(TokenKind::Star),
            b'/' => Some(TokenKind::Slash),
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b'[' => Some(TokenKind::LBracket),
            b']' => Some(TokenKind::RBracket),
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b';' => Some(TokenKind::Semicolon),
            b'.' => Some(TokenKind::Dot),
            b',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single_char {
            self.bump();
            return Ok(Token::new(kind, location));
        }

        if byte.is_ascii_digit() {
            return self.lex_number(location);
        }

        Err(Exception::lex(location, "unable to recognize any token"))
    }

    fn lex_word(&mut self, location: CodeLoc) -> Token {
        let start = self.pos;
        loop {
            let byte = self.peek(0);
            if !byte.is_ascii_alphanumeric() && byte != b'_' {
                break;
            }
            self.bump();
        }
        let word = &self.source[start..self.pos];
        let kind = match word {
            "fn" => TokenKind::Fn,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "return" => TokenKind::Return,
            "print" => TokenKind::Print,
            "array" => TokenKind::Array,
            _ => TokenKind::Ident,
        };
        if kind == TokenKind::Ident {
            Token::with_text(TokenKind::Ident, word.to_owned(), location)
        } else {
            Token::new(kind, location)
        }
    }

    /// A string literal runs to the next `"`. No escape sequences.
    fn lex_string(&mut self, location: CodeLoc) -> Result<Token, Exception> {
        self.bump();
        let start = self.pos;
        while self.peek(0) != 0 && self.peek(0) != b'"' {
            self.bump();
        }
        if self.peek(0) == 0 {
            return Err(Exception::lex(location, "unterminated string literal"));
        }
        let text = self.source[start..self.pos].to_owned();
        self.bump();
        Ok(Token::with_text(TokenKind::Str, text, location))
    }

    /// An integer part, optionally followed by `.` and a fractional part.
    /// No signs, no exponents.
    fn lex_number(&mut self, location: CodeLoc) -> Result<Token, Exception> {
        let start = self.pos;
        while self.peek(0).is_ascii_digit() {
            self.bump();
        }
        if self.peek(0) == b'.' {
            self.bump();
            while self.peek(0).is_ascii_digit() {
                self.bump();
            }
        }
        let text = &self.source[start..self.pos];
        let number: f32 = text
            .parse()
            .map_err(|_| Exception::lex(location, format!("invalid number literal `{text}`")))?;
        Ok(Token::with_number(number, location))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorKind;

    fn kinds(code: &str) -> Vec<TokenKind> {
        tokenize(code).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn two_char_operators_win_over_prefixes() {
        assert_eq!(
            kinds("<= >= == != < > = !"),
            vec![
                TokenKind::LessEq,
                TokenKind::GreaterEq,
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Assign,
                TokenKind::Not,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn keywords_are_reclassified() {
        assert_eq!(
            kinds("fn if else while for return print array arrays fnord"),
            vec![
                TokenKind::Fn,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::For,
                TokenKind::Return,
                TokenKind::Print,
                TokenKind::Array,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn number_payloads() {
        let tokens = tokenize("42 1.5 0.25 7.").unwrap();
        let numbers: Vec<f32> = tokens[..4].iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![42.0, 1.5, 0.25, 7.0]);
    }

    #[test]
    fn string_literal_has_no_escapes() {
        let tokens = tokenize(r#""a\n b""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text, r"a\n b");
    }

    #[test]
    fn comments_are_skipped_and_lines_advance() {
        let tokens = tokenize("x // comment\ny").unwrap();
        assert_eq!(tokens[0].location.line, 1);
        assert_eq!(tokens[1].location.line, 2);
        assert_eq!(tokens[1].text, "y");
    }

    #[test]
    fn columns_increase_within_a_line() {
        let tokens = tokenize("a bb ccc").unwrap();
        let columns: Vec<u32> = tokens[..3].iter().map(|t| t.location.column).collect();
        assert!(columns[0] < columns[1] && columns[1] < columns[2], "{columns:?}");
    }

    #[test]
    fn unknown_byte_is_a_lex_error() {
        let err = tokenize("x = @;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lex);
        assert_eq!(err.location.line, 1);
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let err = tokenize("\"oops").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lex);
    }

    #[test]
    fn stream_always_ends_with_the_sentinel() {
        assert_eq!(kinds(""), vec![TokenKind::End]);
        assert_eq!(kinds("   // only a comment"), vec![TokenKind::End]);
    }

    /// Rendering tokens back to text and lexing again yields the same
    /// kinds and payloads.
    #[test]
    fn lexeme_rendering_round_trips() {
        let code = "boo = fn(x) { if x == 0 { return \"gogo\"; } }; print boo(0) + 1.5;";
        let tokens = tokenize(code).unwrap();
        let rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        let relexed = tokenize(&rendered.join(" ")).unwrap();
        assert_eq!(tokens.len(), relexed.len());
        for (a, b) in tokens.iter().zip(&relexed) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.text, b.text);
            assert_eq!(a.number, b.number);
        }
    }
}
