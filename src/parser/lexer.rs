//! Lexer (tokenizer) for C source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the
//! parser. Line and block comments are skipped. String literals are
//! unescaped here and carried as raw bytes with their terminating NUL, so
//! the parser can intern them directly into the static data region.

use std::fmt;

/// Source position for lexer and parser diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Num(i64),
    /// String literal bytes, unescaped, including the trailing NUL.
    Str(Vec<u8>),

    Ident(String),

    // Keywords
    KwInt,
    KwChar,
    KwShort,
    KwLong,
    KwVoid,
    KwBool,
    KwStruct,
    KwTypedef,
    KwSizeof,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwReturn,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Amp,
    Assign, // =
    EqEq,   // ==
    NotEq,  // !=
    Lt,
    Le,
    Gt,
    Ge,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Arrow, // ->

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: SourceLocation,
}

/// Lexer error with position information.
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub loc: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lex error at {}: {}", self.loc, self.message)
    }
}

impl std::error::Error for LexError {}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments()?;
            let loc = self.loc();
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    loc,
                });
                return Ok(tokens);
            };

            let kind = if c.is_ascii_digit() {
                self.number()
            } else if c == '_' || c.is_ascii_alphabetic() {
                self.ident_or_keyword()
            } else if c == '"' {
                self.string(loc)?
            } else {
                self.punctuator(loc)?
            };
            tokens.push(Token { kind, loc });
        }
    }

    fn loc(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let loc = self.loc();
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                            None => {
                                return Err(LexError {
                                    message: "unterminated block comment".to_string(),
                                    loc,
                                });
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn number(&mut self) -> TokenKind {
        let mut value: i64 = 0;
        while let Some(c) = self.peek() {
            let Some(digit) = c.to_digit(10) else { break };
            value = value.wrapping_mul(10).wrapping_add(digit as i64);
            self.bump();
        }
        TokenKind::Num(value)
    }

    fn ident_or_keyword(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '_' || c.is_ascii_alphanumeric() {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match name.as_str() {
            "int" => TokenKind::KwInt,
            "char" => TokenKind::KwChar,
            "short" => TokenKind::KwShort,
            "long" => TokenKind::KwLong,
            "void" => TokenKind::KwVoid,
            "_Bool" => TokenKind::KwBool,
            "struct" => TokenKind::KwStruct,
            "typedef" => TokenKind::KwTypedef,
            "sizeof" => TokenKind::KwSizeof,
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "while" => TokenKind::KwWhile,
            "for" => TokenKind::KwFor,
            "return" => TokenKind::KwReturn,
            _ => TokenKind::Ident(name),
        }
    }

    fn string(&mut self, loc: SourceLocation) -> Result<TokenKind, LexError> {
        self.bump(); // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    let c = self.bump().ok_or_else(|| LexError {
                        message: "unterminated string literal".to_string(),
                        loc,
                    })?;
                    bytes.push(unescape(c));
                }
                Some(c) => bytes.push(c as u8),
                None => {
                    return Err(LexError {
                        message: "unterminated string literal".to_string(),
                        loc,
                    });
                }
            }
        }
        bytes.push(0);
        Ok(TokenKind::Str(bytes))
    }

    fn punctuator(&mut self, loc: SourceLocation) -> Result<TokenKind, LexError> {
        let c = self.bump().expect("caller checked for a character");
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => {
                if self.peek() == Some('>') {
                    self.bump();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '&' => TokenKind::Amp,
            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::NotEq
                } else {
                    return Err(LexError {
                        message: "unexpected character '!'".to_string(),
                        loc,
                    });
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            other => {
                return Err(LexError {
                    message: format!("unexpected character '{}'", other),
                    loc,
                });
            }
        };
        Ok(kind)
    }
}

/// Escape-sequence mapping. Unknown escapes resolve to the escaped
/// character itself, so `"\j"[0]` is `'j'`.
fn unescape(c: char) -> u8 {
    match c {
        'a' => 7,
        'b' => 8,
        't' => 9,
        'n' => 10,
        'v' => 11,
        'f' => 12,
        'r' => 13,
        'e' => 27,
        '0' => 0,
        other => other as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn simple_tokens() {
        let toks = kinds("int main() { return 0; }");
        assert_eq!(
            toks,
            vec![
                TokenKind::KwInt,
                TokenKind::Ident("main".to_string()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::KwReturn,
                TokenKind::Num(0),
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let toks = kinds("int x; // comment\nint y; /* block\ncomment */ int z;");
        assert_eq!(toks.iter().filter(|k| **k == TokenKind::KwInt).count(), 3);
    }

    #[test]
    fn two_char_operators() {
        let toks = kinds("== != <= >= -> = < >");
        assert_eq!(
            toks[..8],
            [
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Arrow,
                TokenKind::Assign,
                TokenKind::Lt,
                TokenKind::Gt,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        let toks = kinds(r#""a\tb""#);
        assert_eq!(toks[0], TokenKind::Str(vec![b'a', 9, b'b', 0]));
        // Unknown escapes map to the character itself.
        let toks = kinds(r#""\j\k""#);
        assert_eq!(toks[0], TokenKind::Str(vec![b'j', b'k', 0]));
        let toks = kinds(r#""\e\0""#);
        assert_eq!(toks[0], TokenKind::Str(vec![27, 0, 0]));
    }

    #[test]
    fn locations_track_lines() {
        let tokens = Lexer::new("int\n  x;").tokenize().unwrap();
        assert_eq!(tokens[0].loc, SourceLocation::new(1, 1));
        assert_eq!(tokens[1].loc, SourceLocation::new(2, 3));
    }
}
