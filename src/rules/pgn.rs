//! PGN document layer: tag pairs, movetext tokens and termination markers.
//!
//! This module is purely textual. Resolving SAN tokens into moves happens in
//! [`super::game`], where the position is known.

use indexmap::IndexMap;

use super::NotationError;

const TERMINATIONS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Textual pieces of a PGN game.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(super) struct PgnDocument {
    /// Tag pairs in file order.
    pub tags: IndexMap<String, String>,
    /// Move tokens in SAN, without numbers or annotations.
    pub sans: Vec<String>,
    /// Trailing `1-0`, `0-1`, `1/2-1/2` or `*`.
    pub termination: Option<String>,
}

pub(super) fn parse(input: &str) -> Result<PgnDocument, NotationError> {
    let mut document = PgnDocument::default();
    let mut movetext = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && movetext.trim().is_empty() {
            let (key, value) = parse_tag(trimmed)?;
            document.tags.insert(key, value);
        } else {
            movetext.push_str(line);
            movetext.push('\n');
        }
    }

    for token in strip_commentary(&movetext)?.split_whitespace() {
        if TERMINATIONS.contains(&token) {
            document.termination = Some(token.to_string());
            continue;
        }
        if token.starts_with('$') || token.chars().all(|c| c == '.') {
            continue;
        }
        if let Some(san) = strip_move_number(token) {
            document.sans.push(san.to_string());
        }
    }

    Ok(document)
}

/// Render tags and movetext in the layout `chess.js`-style clients expect:
/// one tag per line, a blank line, then `1. e4 e5 2. Nf3`.
pub(super) fn write(
    tags: &IndexMap<String, String>,
    sans: &[String],
    start_fullmove: u32,
    black_first: bool,
    termination: Option<&str>,
) -> String {
    let offset = usize::from(black_first);
    let mut parts = Vec::with_capacity(sans.len() + 1);

    for (index, san) in sans.iter().enumerate() {
        let ply = index + offset;
        let number = start_fullmove as usize + ply / 2;
        if ply % 2 == 0 {
            parts.push(format!("{number}. {san}"));
        } else if index == 0 {
            parts.push(format!("{number}. ... {san}"));
        } else {
            parts.push(san.clone());
        }
    }
    if let Some(marker) = termination {
        parts.push(marker.to_string());
    }
    let movetext = parts.join(" ");

    if tags.is_empty() {
        return movetext;
    }

    let header = tags
        .iter()
        .map(|(key, value)| format!("[{key} \"{}\"]", escape(value)))
        .collect::<Vec<_>>()
        .join("\n");

    if movetext.is_empty() {
        header
    } else {
        format!("{header}\n\n{movetext}")
    }
}

fn parse_tag(line: &str) -> Result<(String, String), NotationError> {
    let malformed = || NotationError::MalformedTag {
        line: line.to_string(),
    };

    let inner = line
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(malformed)?;
    let (key, raw_value) = inner.trim().split_once(char::is_whitespace).ok_or_else(malformed)?;
    let raw_value = raw_value
        .trim()
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(malformed)?;

    Ok((key.to_string(), unescape(raw_value)))
}

fn strip_commentary(movetext: &str) -> Result<String, NotationError> {
    let mut cleaned = String::with_capacity(movetext.len());
    let mut chars = movetext.chars();
    let mut variation_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if !chars.by_ref().any(|c| c == '}') {
                    return Err(NotationError::Unterminated { kind: "comment" });
                }
                cleaned.push(' ');
            }
            ';' => {
                chars.by_ref().find(|c| *c == '\n');
                cleaned.push(' ');
            }
            '(' => {
                variation_depth += 1;
                cleaned.push(' ');
            }
            ')' if variation_depth > 0 => {
                variation_depth -= 1;
                cleaned.push(' ');
            }
            _ if variation_depth > 0 => {}
            other => cleaned.push(other),
        }
    }

    if variation_depth > 0 {
        return Err(NotationError::Unterminated { kind: "variation" });
    }
    Ok(cleaned)
}

/// Drop a leading move number (`12.`, `12...`, `12.e4`). Returns `None` when
/// nothing but the number is left. Castling written as `0-0` is kept intact.
fn strip_move_number(token: &str) -> Option<&str> {
    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == token.len() || !rest.starts_with('.') {
        return Some(token);
    }
    let rest = rest.trim_start_matches('.');
    (!rest.is_empty()).then_some(rest)
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(value: &str) -> String {
    value.replace("\\\"", "\"").replace("\\\\", "\\")
}
