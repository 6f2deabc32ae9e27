//! Script Lexer
//!
//! Turns action-code text into a token stream. Strings accept single or
//! double quotes with a small escape set; `//` starts a line comment.

use crate::error::{ScriptError, ScriptResult};

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    // Keywords
    Let,
    If,
    Else,
    While,
    For,
    In,
    Return,
    True,
    False,
    Null,
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Dot,
    Colon,
    // Operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Not,
    AndAnd,
    OrOr,
}

impl Token {
    /// Short description for parse error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier '{name}'"),
            Token::Str(_) => "string literal".to_string(),
            Token::Num(n) => format!("number {n}"),
            other => format!("'{}'", other.lexeme()),
        }
    }

    fn lexeme(&self) -> &'static str {
        match self {
            Token::Let => "let",
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::For => "for",
            Token::In => "in",
            Token::Return => "return",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Semi => ";",
            Token::Dot => ".",
            Token::Colon => ":",
            Token::Assign => "=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Eq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Not => "!",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Ident(_) | Token::Str(_) | Token::Num(_) => "",
        }
    }
}

/// A token with the line it started on, for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
}

/// Tokenize a whole script.
pub fn tokenize(source: &str) -> ScriptResult<Vec<SpannedToken>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1usize;

    while let Some(&ch) = chars.peek() {
        match ch {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    // Line comment: consume to end of line
                    for c in chars.by_ref() {
                        if c == '\n' {
                            line += 1;
                            break;
                        }
                    }
                } else {
                    tokens.push(SpannedToken {
                        token: Token::Slash,
                        line,
                    });
                }
            }
            '"' | '\'' => {
                let quote = ch;
                chars.next();
                let start_line = line;
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    match c {
                        '\\' => match chars.next() {
                            Some('\\') => text.push('\\'),
                            Some('"') => text.push('"'),
                            Some('\'') => text.push('\''),
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some('r') => text.push('\r'),
                            Some(other) => {
                                return Err(ScriptError::parse(format!(
                                    "line {line}: unsupported escape sequence \\{other}"
                                )))
                            }
                            None => {
                                return Err(ScriptError::parse(format!(
                                    "line {start_line}: unterminated string literal"
                                )))
                            }
                        },
                        '\n' => {
                            line += 1;
                            text.push('\n');
                        }
                        other => text.push(other),
                    }
                }
                if !closed {
                    return Err(ScriptError::parse(format!(
                        "line {start_line}: unterminated string literal"
                    )));
                }
                tokens.push(SpannedToken {
                    token: Token::Str(text),
                    line: start_line,
                });
            }
            c if c.is_ascii_digit() => {
                let mut text = String::new();
                let mut seen_dot = false;
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        chars.next();
                    } else if c == '.' && !seen_dot {
                        // Lookahead: a dot not followed by a digit is a member access
                        let mut ahead = chars.clone();
                        ahead.next();
                        if ahead.peek().map(|d| d.is_ascii_digit()).unwrap_or(false) {
                            seen_dot = true;
                            text.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    } else {
                        break;
                    }
                }
                let num: f64 = text.parse().map_err(|_| {
                    ScriptError::parse(format!("line {line}: invalid number literal '{text}'"))
                })?;
                tokens.push(SpannedToken {
                    token: Token::Num(num),
                    line,
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match text.as_str() {
                    "let" => Token::Let,
                    "if" => Token::If,
                    "else" => Token::Else,
                    "while" => Token::While,
                    "for" => Token::For,
                    "in" => Token::In,
                    "return" => Token::Return,
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => Token::Ident(text),
                };
                tokens.push(SpannedToken { token, line });
            }
            _ => {
                chars.next();
                let token = match ch {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    ',' => Token::Comma,
                    ';' => Token::Semi,
                    '.' => Token::Dot,
                    ':' => Token::Colon,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '%' => Token::Percent,
                    '=' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::Eq
                        } else {
                            Token::Assign
                        }
                    }
                    '!' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::NotEq
                        } else {
                            Token::Not
                        }
                    }
                    '<' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::LtEq
                        } else {
                            Token::Lt
                        }
                    }
                    '>' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::GtEq
                        } else {
                            Token::Gt
                        }
                    }
                    '&' => {
                        if chars.peek() == Some(&'&') {
                            chars.next();
                            Token::AndAnd
                        } else {
                            return Err(ScriptError::parse(format!(
                                "line {line}: unexpected character '&'"
                            )));
                        }
                    }
                    '|' => {
                        if chars.peek() == Some(&'|') {
                            chars.next();
                            Token::OrOr
                        } else {
                            return Err(ScriptError::parse(format!(
                                "line {line}: unexpected character '|'"
                            )));
                        }
                    }
                    other => {
                        return Err(ScriptError::parse(format!(
                            "line {line}: unexpected character '{other}'"
                        )))
                    }
                };
                tokens.push(SpannedToken { token, line });
            }
        }
    }

    Ok(tokens)
}
