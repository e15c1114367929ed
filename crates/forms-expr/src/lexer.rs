//! Tokenizer for the formula language.

use crate::error::EvalError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
    Eof,
}

impl Token {
    /// Short human-readable description used in syntax errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Str(_) => "string literal".to_string(),
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::Eof => "end of formula".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Bang => "!",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::Question => "?",
            Token::Colon => ":",
            _ => "",
        }
    }
}

/// A token with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Splits a formula into tokens, ending with [`Token::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Spanned>, EvalError> {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;

        if b.is_ascii_digit() || (b == b'.' && i + 1 < len && bytes[i + 1].is_ascii_digit()) {
            i = scan_number(bytes, i);
            let text = &src[start..i];
            let n: f64 = text
                .parse()
                .map_err(|_| EvalError::syntax(start, format!("invalid number '{}'", text)))?;
            tokens.push(Spanned {
                token: Token::Number(n),
                position: start,
            });
            continue;
        }

        if is_ident_start(b) {
            i += 1;
            while i < len && is_ident_cont(bytes[i]) {
                i += 1;
            }
            tokens.push(Spanned {
                token: Token::Ident(src[start..i].to_string()),
                position: start,
            });
            continue;
        }

        if b == b'\'' || b == b'"' {
            let (s, next) = scan_string(src, i)?;
            tokens.push(Spanned {
                token: Token::Str(s),
                position: start,
            });
            i = next;
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let (token, width) = match (b, next) {
            (b'=', Some(b'=')) => (Token::EqEq, 2),
            (b'!', Some(b'=')) => (Token::NotEq, 2),
            (b'<', Some(b'=')) => (Token::Le, 2),
            (b'>', Some(b'=')) => (Token::Ge, 2),
            (b'&', Some(b'&')) => (Token::AndAnd, 2),
            (b'|', Some(b'|')) => (Token::OrOr, 2),
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Star, 1),
            (b'/', _) => (Token::Slash, 1),
            (b'%', _) => (Token::Percent, 1),
            (b'<', _) => (Token::Lt, 1),
            (b'>', _) => (Token::Gt, 1),
            (b'!', _) => (Token::Bang, 1),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            (b',', _) => (Token::Comma, 1),
            (b'?', _) => (Token::Question, 1),
            (b':', _) => (Token::Colon, 1),
            (b'=', _) => return Err(EvalError::syntax(start, "assignment is not supported")),
            (b'.', _) => {
                return Err(EvalError::syntax(start, "property access is not supported"));
            }
            (b'&', _) | (b'|', _) => {
                return Err(EvalError::syntax(start, "bitwise operators are not supported"));
            }
            _ => {
                let c = src[start..].chars().next().unwrap_or('?');
                return Err(EvalError::syntax(start, format!("unexpected character '{}'", c)));
            }
        };
        tokens.push(Spanned {
            token,
            position: start,
        });
        i += width;
    }

    tokens.push(Spanned {
        token: Token::Eof,
        position: len,
    });
    Ok(tokens)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_cont(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scans `digits [. digits] [e [+-] digits]` and returns the end offset.
fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    let len = bytes.len();
    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < len && bytes[i] == b'.' && i + 1 < len && bytes[i + 1].is_ascii_digit() {
        i += 1;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < len && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < len && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < len && bytes[j].is_ascii_digit() {
            while j < len && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

/// Scans a quoted string starting at `start`. Returns the unescaped text
/// and the offset just past the closing quote.
fn scan_string(src: &str, start: usize) -> Result<(String, usize), EvalError> {
    let mut chars = src[start..].char_indices();
    let (_, quote) = chars
        .next()
        .ok_or_else(|| EvalError::syntax(start, "expected string"))?;
    let mut out = String::new();

    while let Some((offset, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((out, start + offset + c.len_utf8())),
            '\\' => {
                let (esc_at, esc) = chars
                    .next()
                    .ok_or_else(|| EvalError::syntax(start, "unterminated string"))?;
                match esc {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    '\\' => out.push('\\'),
                    '\'' => out.push('\''),
                    '"' => out.push('"'),
                    other => {
                        return Err(EvalError::syntax(
                            start + esc_at,
                            format!("unknown escape '\\{}'", other),
                        ));
                    }
                }
            }
            c => out.push(c),
        }
    }
    Err(EvalError::syntax(start, "unterminated string"))
}
