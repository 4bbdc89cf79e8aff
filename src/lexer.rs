//! Hand-written lexer. Not part of the core's budget (spec.md treats the
//! parser as an external collaborator), so it is kept deliberately simple:
//! one pass over `char`s, no lookahead beyond one character.

use crate::error::{Error, Result, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(&'static str),
    Int(i64),
    Decimal(String),
    Str(String),

    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Semi,

    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Pipe2,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

const KEYWORDS: &[&str] = &[
    "let", "true", "false", "null", "and", "or", "not", "is", "like", "as", "cast", "between",
    "in",
];

pub fn lex(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut pos = 0usize;
    let mut tokens = Vec::new();

    macro_rules! push {
        ($kind:expr, $start:expr) => {
            tokens.push(Token {
                kind: $kind,
                span: Span::new($start, pos),
            });
        };
    }

    while pos < chars.len() {
        let start = pos;
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c == '#' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        if c.is_ascii_digit() {
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos < chars.len() && chars[pos] == '.' && pos + 1 < chars.len() && chars[pos + 1].is_ascii_digit() {
                pos += 1;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                push!(TokenKind::Decimal(text), start);
            } else {
                let text: String = chars[start..pos].iter().collect();
                let value: i64 = text.parse().map_err(|_| {
                    Error::simple(format!("invalid integer literal `{text}`"))
                        .with_span(Some(Span::new(start, pos)))
                })?;
                push!(TokenKind::Int(value), start);
            }
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            let lower = text.to_lowercase();
            if let Some(kw) = KEYWORDS.iter().find(|k| **k == lower) {
                push!(TokenKind::Keyword(kw), start);
            } else {
                push!(TokenKind::Ident(text), start);
            }
            continue;
        }

        if c == '\'' {
            pos += 1;
            let mut value = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(Error::simple("unterminated string literal")
                        .with_span(Some(Span::new(start, pos))));
                }
                if chars[pos] == '\'' {
                    if pos + 1 < chars.len() && chars[pos + 1] == '\'' {
                        value.push('\'');
                        pos += 2;
                        continue;
                    }
                    pos += 1;
                    break;
                }
                value.push(chars[pos]);
                pos += 1;
            }
            push!(TokenKind::Str(value), start);
            continue;
        }

        macro_rules! two_char {
            ($second:expr, $two:expr, $one:expr) => {{
                pos += 1;
                if pos < chars.len() && chars[pos] == $second {
                    pos += 1;
                    push!($two, start);
                } else {
                    push!($one, start);
                }
            }};
        }

        match c {
            '(' => {
                pos += 1;
                push!(TokenKind::LParen, start);
            }
            ')' => {
                pos += 1;
                push!(TokenKind::RParen, start);
            }
            '{' => {
                pos += 1;
                push!(TokenKind::LBrace, start);
            }
            '}' => {
                pos += 1;
                push!(TokenKind::RBrace, start);
            }
            ',' => {
                pos += 1;
                push!(TokenKind::Comma, start);
            }
            '.' => {
                pos += 1;
                push!(TokenKind::Dot, start);
            }
            ':' => {
                pos += 1;
                push!(TokenKind::Colon, start);
            }
            ';' => {
                pos += 1;
                push!(TokenKind::Semi, start);
            }
            '=' => {
                pos += 1;
                push!(TokenKind::Eq, start);
            }
            '<' => two_char!('=', TokenKind::Le, TokenKind::Lt),
            '>' => two_char!('=', TokenKind::Ge, TokenKind::Gt),
            '!' => {
                pos += 1;
                if pos < chars.len() && chars[pos] == '=' {
                    pos += 1;
                    push!(TokenKind::Ne, start);
                } else {
                    return Err(Error::simple("unexpected `!`")
                        .with_span(Some(Span::new(start, pos))));
                }
            }
            '+' => {
                pos += 1;
                push!(TokenKind::Plus, start);
            }
            '-' => {
                pos += 1;
                push!(TokenKind::Minus, start);
            }
            '*' => {
                pos += 1;
                push!(TokenKind::Star, start);
            }
            '/' => {
                pos += 1;
                push!(TokenKind::Slash, start);
            }
            '%' => {
                pos += 1;
                push!(TokenKind::Percent, start);
            }
            '^' => {
                pos += 1;
                push!(TokenKind::Caret, start);
            }
            '|' => {
                pos += 1;
                if pos < chars.len() && chars[pos] == '|' {
                    pos += 1;
                    push!(TokenKind::Pipe2, start);
                } else {
                    return Err(Error::simple("unexpected `|`")
                        .with_span(Some(Span::new(start, pos))));
                }
            }
            _ => {
                return Err(Error::simple(format!("unexpected character `{c}`"))
                    .with_span(Some(Span::new(start, start + 1))));
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(pos, pos),
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_filter_call() {
        let got = kinds("region.filter(r_name='EUROPE')");
        assert_eq!(
            got,
            vec![
                TokenKind::Ident("region".into()),
                TokenKind::Dot,
                TokenKind::Ident("filter".into()),
                TokenKind::LParen,
                TokenKind::Ident("r_name".into()),
                TokenKind::Eq,
                TokenKind::Str("EUROPE".into()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escaping_doubles_quote() {
        let got = kinds("'it''s'");
        assert_eq!(got, vec![TokenKind::Str("it's".into()), TokenKind::Eof]);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let got = kinds("AND Or NOT");
        assert_eq!(
            got,
            vec![
                TokenKind::Keyword("and"),
                TokenKind::Keyword("or"),
                TokenKind::Keyword("not"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn decimal_literal() {
        let got = kinds("3.14");
        assert_eq!(got, vec![TokenKind::Decimal("3.14".into()), TokenKind::Eof]);
    }
}
