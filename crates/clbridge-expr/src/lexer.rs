//! Tokenizer for the worker's expression syntax.

use crate::error::{ExprError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semi,
    Eq,
    Plus,
    Minus,
    Star,
    Slash,
    /// Statement separator. Suppressed inside brackets.
    Newline,
}

impl Token {
    /// Human-readable name for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier {name:?}"),
            Token::Int(i) => format!("integer {i}"),
            Token::Float(x) => format!("float {x:?}"),
            Token::Str(_) => "string literal".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Semi => "';'".to_string(),
            Token::Eq => "'='".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Newline => "newline".to_string(),
        }
    }
}

/// Tokenize source text.
///
/// Newlines inside parentheses, brackets, or braces are treated as
/// plain whitespace so multi-line literals need no continuation
/// syntax. `#` starts a comment running to end of line.
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    let mut bracket_depth: usize = 0;

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '\n' => {
                chars.next();
                if bracket_depth == 0 {
                    tokens.push(Token::Newline);
                }
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '(' => {
                chars.next();
                bracket_depth += 1;
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                bracket_depth = bracket_depth.saturating_sub(1);
                tokens.push(Token::RParen);
            }
            '[' => {
                chars.next();
                bracket_depth += 1;
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                bracket_depth = bracket_depth.saturating_sub(1);
                tokens.push(Token::RBracket);
            }
            '{' => {
                chars.next();
                bracket_depth += 1;
                tokens.push(Token::LBrace);
            }
            '}' => {
                chars.next();
                bracket_depth = bracket_depth.saturating_sub(1);
                tokens.push(Token::RBrace);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            ';' => {
                chars.next();
                tokens.push(Token::Semi);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '"' => {
                chars.next();
                tokens.push(Token::Str(lex_string(&mut chars)?));
            }
            c if c.is_ascii_digit() => {
                tokens.push(lex_number(&mut chars)?);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => {
                return Err(ExprError::syntax(format!("unexpected character {other:?}")));
            }
        }
    }

    Ok(tokens)
}

fn lex_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String> {
    let mut text = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(text),
            Some('\\') => match chars.next() {
                Some('\\') => text.push('\\'),
                Some('"') => text.push('"'),
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some('r') => text.push('\r'),
                Some(other) => {
                    return Err(ExprError::syntax(format!(
                        "unknown string escape '\\{other}'"
                    )));
                }
                None => return Err(ExprError::syntax("unterminated string literal")),
            },
            Some(other) => text.push(other),
            None => return Err(ExprError::syntax("unterminated string literal")),
        }
    }
}

fn lex_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Token> {
    let mut text = String::new();
    let mut is_float = false;

    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            chars.next();
        } else {
            break;
        }
    }

    if let Some(&'.') = chars.peek() {
        is_float = true;
        text.push('.');
        chars.next();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                chars.next();
            } else {
                break;
            }
        }
    }

    if let Some(&c) = chars.peek() {
        if c == 'e' || c == 'E' {
            is_float = true;
            text.push(c);
            chars.next();
            if let Some(&sign) = chars.peek() {
                if sign == '+' || sign == '-' {
                    text.push(sign);
                    chars.next();
                }
            }
            let mut digits = false;
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    text.push(d);
                    chars.next();
                    digits = true;
                } else {
                    break;
                }
            }
            if !digits {
                return Err(ExprError::syntax(format!(
                    "malformed exponent in number {text:?}"
                )));
            }
        }
    }

    if is_float {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| ExprError::syntax(format!("malformed float literal {text:?}")))
    } else {
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| ExprError::syntax(format!("integer literal {text} out of range")))
    }
}
