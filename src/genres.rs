//! Genre lists are persisted as one text column.
//!
//! Written form: items joined by `,`. A backslash escapes the character
//! after it, and `\`, `,` and `[` are always written escaped, so an encoded
//! value never starts with `[`. Older rows hold a list literal such as
//! `['Jazz', 'Reggae']`; [`decode`] reads both forms, including the
//! `\r`, `\xNN`, `\uNNNN` and `\UNNNNNNNN` escapes those literals carry.
//!
//! Blank names (empty or whitespace only) are not genres: `encode` skips
//! them and `decode` never returns one.

use std::iter::Peekable;
use std::str::Chars;

const DELIMITER: char = ',';
const ESCAPE: char = '\\';
const LIST_OPEN: char = '[';
const LIST_CLOSE: char = ']';

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenreError {
    #[error("malformed genre text: {0}")]
    Malformed(String),
}

fn malformed(reason: impl Into<String>) -> GenreError {
    GenreError::Malformed(reason.into())
}

pub fn encode(genres: &[String]) -> String {
    let mut out = String::new();
    for (i, genre) in genres.iter().filter(|g| !is_blank(g)).enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        for c in genre.chars() {
            if matches!(c, ESCAPE | DELIMITER | LIST_OPEN) {
                out.push(ESCAPE);
            }
            out.push(c);
        }
    }
    out
}

fn is_blank(genre: &str) -> bool {
    genre.trim().is_empty()
}

pub fn decode(raw: &str) -> Result<Vec<String>, GenreError> {
    if is_blank(raw) {
        return Ok(Vec::new());
    }
    if raw.trim_start().starts_with(LIST_OPEN) {
        decode_list_literal(raw.trim())
    } else {
        decode_delimited(raw)
    }
}

/// Like [`decode`], but a broken value only costs that one record its genres.
pub fn decode_or_empty(raw: &str, owner: &'static str, id: i64) -> Vec<String> {
    decode(raw).unwrap_or_else(|e| {
        tracing::warn!(owner, id, raw, error = %e, "discarding undecodable genre list");
        Vec::new()
    })
}

fn decode_delimited(raw: &str) -> Result<Vec<String>, GenreError> {
    let mut genres = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err(malformed("dangling escape at end of input")),
            },
            DELIMITER => {
                let genre = std::mem::take(&mut current);
                if !is_blank(&genre) {
                    genres.push(genre);
                }
            }
            c => current.push(c),
        }
    }
    if !is_blank(&current) {
        genres.push(current);
    }
    Ok(genres)
}

fn decode_list_literal(raw: &str) -> Result<Vec<String>, GenreError> {
    let mut chars = raw.chars().peekable();
    chars.next();

    let mut genres = Vec::new();
    loop {
        skip_whitespace(&mut chars);
        match chars.next() {
            Some(LIST_CLOSE) => break,
            Some(quote @ ('\'' | '"')) => {
                let genre = read_quoted(&mut chars, quote)?;
                if !is_blank(&genre) {
                    genres.push(genre);
                }
                skip_whitespace(&mut chars);
                match chars.next() {
                    Some(DELIMITER) => continue,
                    Some(LIST_CLOSE) => break,
                    Some(other) => {
                        return Err(malformed(format!("expected `,` or `]`, found `{other}`")));
                    }
                    None => return Err(malformed("unterminated list")),
                }
            }
            Some(other) => return Err(malformed(format!("expected a quoted item, found `{other}`"))),
            None => return Err(malformed("unterminated list")),
        }
    }

    if let Some(rest) = chars.next() {
        return Err(malformed(format!("unexpected `{rest}` after closing bracket")));
    }
    Ok(genres)
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> Result<String, GenreError> {
    let mut genre = String::new();
    loop {
        match chars.next() {
            Some(ESCAPE) => match chars.next() {
                Some('n') => genre.push('\n'),
                Some('t') => genre.push('\t'),
                Some('r') => genre.push('\r'),
                Some('x') => genre.push(read_code_point(chars, 2)?),
                Some('u') => genre.push(read_code_point(chars, 4)?),
                Some('U') => genre.push(read_code_point(chars, 8)?),
                Some(c @ ('\\' | '\'' | '"')) => genre.push(c),
                Some(c) => {
                    genre.push(ESCAPE);
                    genre.push(c);
                }
                None => return Err(malformed("unterminated string")),
            },
            Some(c) if c == quote => return Ok(genre),
            Some(c) => genre.push(c),
            None => return Err(malformed("unterminated string")),
        }
    }
}

fn read_code_point(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Result<char, GenreError> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return Err(malformed("truncated escape sequence"));
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| malformed(format!("invalid escape sequence `{hex}`")))
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}
