//! Reading and updating `KEY=value` environment files.
//!
//! Only the subset the framework's dotenv loader agrees on is understood:
//! `#` comments, an optional `export ` prefix, single or double quotes, and
//! ` #` inline comments after unquoted values. The first definition wins.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

/// Value of `field` in `contents`, if it is defined and non-empty.
///
/// Files are not required to be UTF-8; each line is decoded lossily on its own.
pub fn key_value(contents: &[u8], field: &str) -> Option<String> {
    contents
        .split(|byte| *byte == b'\n')
        .map(String::from_utf8_lossy)
        .find_map(|line| match parse_assignment(&line) {
            Some((key, value)) if key == field => Some(value.to_string()),
            _ => None,
        })
        .filter(|value| !value.is_empty())
}

/// Read `path` and return the non-empty value of `field`.
pub fn read_key(path: &Path, field: &str) -> io::Result<Option<String>> {
    let contents = fs::read(path)?;
    Ok(key_value(&contents, field))
}

/// Return `contents` with `field` set to `value`.
///
/// The first existing definition is replaced in place, keeping its line ending;
/// otherwise a new line is appended. Every other byte is preserved.
pub fn set_key(contents: &[u8], field: &str, value: &str) -> Vec<u8> {
    let mut output = Vec::with_capacity(contents.len() + field.len() + value.len() + 2);
    let mut replaced = false;

    for line in contents.split_inclusive(|byte| *byte == b'\n') {
        if !replaced {
            let body_len = line
                .iter()
                .rposition(|byte| !matches!(byte, b'\n' | b'\r'))
                .map_or(0, |last| last + 1);
            let body: Cow<'_, str> = String::from_utf8_lossy(&line[..body_len]);
            if matches!(parse_assignment(&body), Some((key, _)) if key == field) {
                if body.trim_start().starts_with("export ") {
                    output.extend_from_slice(b"export ");
                }
                output.extend_from_slice(field.as_bytes());
                output.push(b'=');
                output.extend_from_slice(value.as_bytes());
                output.extend_from_slice(&line[body_len..]);
                replaced = true;
                continue;
            }
        }
        output.extend_from_slice(line);
    }

    if !replaced {
        if !output.is_empty() && !output.ends_with(b"\n") {
            output.push(b'\n');
        }
        output.extend_from_slice(field.as_bytes());
        output.push(b'=');
        output.extend_from_slice(value.as_bytes());
        output.push(b'\n');
    }

    output
}

/// Persist `field=value` into the file at `path`, in place.
///
/// The file is rewritten rather than replaced so bind-mounted files keep working.
pub fn write_key(path: &Path, field: &str, value: &str) -> io::Result<()> {
    let contents = fs::read(path)?;
    fs::write(path, set_key(&contents, field, value))
}

/// Split a line into `(key, unquoted value)`; `None` for blanks and comments.
fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
    let (key, raw) = line.split_once('=')?;
    Some((key.trim(), unquote(raw.trim())))
}

fn unquote(raw: &str) -> &str {
    if raw.starts_with('#') {
        return "";
    }
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            return match rest.find(quote) {
                Some(end) => &rest[..end],
                None => rest,
            };
        }
    }
    match raw.find(" #") {
        Some(comment) => raw[..comment].trim_end(),
        None => raw,
    }
}
