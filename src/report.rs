//! External collaborator: report serialization and parsing.
//!
//! A line-oriented text grammar for duplicate sets: `Set` / `Instance` /
//! `Singletons` headers, path lines marked with a selection glyph, and
//! quoted path literals with C-style escaping (`\t \n \r \\`, `\xNN`,
//! `\uNNNN`, `\UNNNNNNNN`) plus hex-escaped surrounding whitespace so
//! quoting can't hide it.

use crate::error::{Error, Result};
use crate::identity::FileInstance;
use crate::partition::DuplicateSet;
use std::convert::TryFrom;
use std::fmt::Write as _;
use std::io::{BufRead, Write};

/// Selection mark on a reported path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// `>`: exactly one instance was picked.
    Unique,
    /// `?`: ambiguous (zero or multiple candidates).
    Ambiguous,
    /// Leading space: unselected, a candidate for deletion.
    Unmarked,
}

impl Mark {
    fn glyph(self) -> char {
        match self {
            Mark::Unique => '>',
            Mark::Ambiguous => '?',
            Mark::Unmarked => ' ',
        }
    }
}

/// One path line as parsed back from a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPath {
    pub mark: Mark,
    pub path: PathLiteral,
}

/// A path literal is either a string (from a quoted, non-`b`-prefixed
/// literal) or an opaque byte string (from a `b`-prefixed literal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathLiteral {
    Text(String),
    Bytes(Vec<u8>),
}

/// One parsed `Instance` region: the (possibly absent) alias count
/// comment, and its path lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInstance {
    pub paths: Vec<ReportPath>,
}

/// One parsed `Set` region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSet {
    pub instances: Vec<ReportInstance>,
    pub singletons: Vec<ReportPath>,
}

fn format_char(c: char) -> String {
    match c {
        '\t' => "\\t".to_string(),
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\\' => "\\\\".to_string(),
        c if c.is_control() => format!("\\x{:02X}", c as u32),
        c => c.to_string(),
    }
}

fn format_byte(b: u8) -> String {
    match b {
        0x09 => "\\t".to_string(),
        0x0A => "\\n".to_string(),
        0x0D => "\\r".to_string(),
        0x5C => "\\\\".to_string(),
        0x20..=0x7E => (b as char).to_string(),
        _ => format!("\\x{:02X}", b),
    }
}

fn escape_surrounding_space(s: &str) -> String {
    let leading = s.len() - s.trim_start_matches(' ').len();
    let trailing = s.len() - s.trim_end_matches(' ').len();
    let mid = &s[leading..s.len() - trailing];
    let mut out = String::new();
    for _ in 0..leading {
        out.push_str("\\x20");
    }
    out.push_str(mid);
    for _ in 0..trailing {
        out.push_str("\\x20");
    }
    out
}

/// Formats a path as a quoted literal, as `format_path` does in the
/// original: text paths get per-character escaping, byte paths get a
/// `b`-prefix and per-byte escaping. Surrounding spaces are always
/// hex-escaped so quoting can't hide them.
pub fn format_path(literal: &PathLiteral) -> String {
    match literal {
        PathLiteral::Text(s) => {
            let escaped: String = s.chars().map(format_char).collect();
            format!("\"{}\"", escape_surrounding_space(&escaped))
        }
        PathLiteral::Bytes(b) => {
            let escaped: String = b.iter().map(|&byte| format_byte(byte)).collect();
            format!("b\"{}\"", escape_surrounding_space(&escaped))
        }
    }
}

fn parse_hex_code(chars: &[char], start: usize, len: usize) -> Result<(u32, usize)> {
    if start + len > chars.len() {
        return Err(Error::report_parse(0, "incomplete hex escape"));
    }
    let s: String = chars[start..start + len].iter().collect();
    u32::from_str_radix(&s, 16)
        .map(|v| (v, start + len))
        .map_err(|_| Error::report_parse(0, "invalid hex escape"))
}

/// Parses the body of a quoted path literal (contents between the
/// quotes, with any leading `b` prefix already stripped by the caller).
fn parse_escaped_body(body: &str, is_bytes: bool) -> Result<PathLiteral> {
    let chars: Vec<char> = body.chars().collect();
    let mut codes: Vec<u32> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            let esc = *chars.get(i + 1).ok_or_else(|| Error::report_parse(0, "dangling escape"))?;
            match esc {
                't' => { codes.push(0x09); i += 2; }
                'n' => { codes.push(0x0A); i += 2; }
                'r' => { codes.push(0x0D); i += 2; }
                '\\' => { codes.push(0x5C); i += 2; }
                'x' => { let (v, next) = parse_hex_code(&chars, i + 2, 2)?; codes.push(v); i = next; }
                'u' => { let (v, next) = parse_hex_code(&chars, i + 2, 4)?; codes.push(v); i = next; }
                'U' => { let (v, next) = parse_hex_code(&chars, i + 2, 8)?; codes.push(v); i = next; }
                other => return Err(Error::report_parse(0, format!("invalid escape '\\{}'", other))),
            }
        } else {
            codes.push(c as u32);
            i += 1;
        }
    }

    if is_bytes {
        let bytes: Result<Vec<u8>> = codes
            .iter()
            .map(|&c| u8::try_from(c).map_err(|_| Error::report_parse(0, "byte literal code point out of range")))
            .collect();
        Ok(PathLiteral::Bytes(bytes?))
    } else {
        let s: String = codes
            .into_iter()
            .map(|c| char::from_u32(c).ok_or_else(|| Error::report_parse(0, "invalid code point")))
            .collect::<Result<String>>()?;
        Ok(PathLiteral::Text(s))
    }
}

/// Parses one quoted path literal, with an optional leading `b` prefix
/// for a byte-string literal.
pub fn parse_path_literal(s: &str) -> Result<PathLiteral> {
    let s = s.trim();
    let (is_bytes, rest) = match s.strip_prefix('b') {
        Some(r) if r.starts_with('\'') || r.starts_with('"') => (true, r),
        _ => (false, s),
    };

    let quote = rest.chars().next().ok_or_else(|| Error::report_parse(0, "empty path literal"))?;
    if quote != '\'' && quote != '"' {
        return Err(Error::report_parse(0, "path literal must be quoted"));
    }
    let closing = rest.rfind(quote).filter(|&idx| idx > 0);
    let closing = closing.ok_or_else(|| Error::report_parse(0, "unterminated path literal"))?;
    let body = &rest[1..closing];

    parse_escaped_body(body, is_bytes)
}

/// Serializes a sequence of [`DuplicateSet`]s as a report.
pub fn write_report<W: Write>(mut out: W, sets: &[DuplicateSet]) -> std::io::Result<()> {
    for set in sets {
        writeln!(out, "Set")?;
        for instance in set.instances() {
            write_instance(&mut out, instance)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_instance<W: Write>(out: &mut W, instance: &FileInstance) -> std::io::Result<()> {
    if instance.entries().len() > 1 {
        writeln!(out, "Instance # {}", instance.entries().len())?;
    } else {
        writeln!(out, "Instance")?;
    }
    for entry in instance.entries() {
        let literal = PathLiteral::Text(entry.path().to_string_lossy().into_owned());
        let mut line = String::new();
        write!(line, "  {}", format_path(&literal)).unwrap();
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Parses a full report from `input`, yielding one [`ReportSet`] per
/// blank-line-or-EOF-terminated region.
pub fn parse_report<R: BufRead>(input: R) -> Result<Vec<ReportSet>> {
    let mut sets = Vec::new();
    let mut current_instances: Vec<ReportInstance> = Vec::new();
    let mut current_singletons: Vec<ReportPath> = Vec::new();
    let mut in_singletons = false;
    let mut pending_instance: Option<Vec<ReportPath>> = None;

    let flush_instance = |pending: &mut Option<Vec<ReportPath>>, instances: &mut Vec<ReportInstance>| {
        if let Some(paths) = pending.take() {
            instances.push(ReportInstance { paths });
        }
    };

    for (lineno, line) in input.lines().enumerate() {
        let line = line.map_err(|e| Error::io(std::path::PathBuf::new(), e))?;
        let lineno = lineno + 1;

        if line.starts_with('#') {
            continue;
        }

        if line.trim().is_empty() {
            flush_instance(&mut pending_instance, &mut current_instances);
            if !current_instances.is_empty() || !current_singletons.is_empty() {
                sets.push(ReportSet {
                    instances: std::mem::take(&mut current_instances),
                    singletons: std::mem::take(&mut current_singletons),
                });
            }
            in_singletons = false;
            continue;
        }

        let trimmed = line.trim_start();
        let header = trimmed.split('#').next().unwrap_or(trimmed).trim_end();
        if header == "Set" {
            flush_instance(&mut pending_instance, &mut current_instances);
            if !current_instances.is_empty() || !current_singletons.is_empty() {
                sets.push(ReportSet {
                    instances: std::mem::take(&mut current_instances),
                    singletons: std::mem::take(&mut current_singletons),
                });
            }
            in_singletons = false;
            continue;
        }

        if header == "Instance" {
            flush_instance(&mut pending_instance, &mut current_instances);
            pending_instance = Some(Vec::new());
            in_singletons = false;
            continue;
        }

        if trimmed == "Singletons" {
            flush_instance(&mut pending_instance, &mut current_instances);
            in_singletons = true;
            continue;
        }

        // A path line: optional mark glyph, a space, then a quoted literal.
        let mut chars = line.chars();
        let marker = chars.next().ok_or_else(|| Error::report_parse(lineno, "empty line"))?;
        let sep = chars.next().ok_or_else(|| Error::report_parse(lineno, "missing path"))?;
        if sep != ' ' {
            return Err(Error::report_parse(lineno, "marker must be followed by a space"));
        }
        let rest: String = chars.collect();
        if rest.trim().is_empty() {
            return Err(Error::report_parse(lineno, "missing path"));
        }

        let mark = match marker {
            '>' => Mark::Unique,
            '?' => Mark::Ambiguous,
            ' ' => Mark::Unmarked,
            other => return Err(Error::report_parse(lineno, format!("invalid mark glyph '{}'", other))),
        };

        let literal = parse_path_literal(rest.trim())
            .map_err(|_| Error::report_parse(lineno, "invalid path literal"))?;
        let report_path = ReportPath { mark, path: literal };

        if in_singletons {
            current_singletons.push(report_path);
        } else if let Some(paths) = pending_instance.as_mut() {
            paths.push(report_path);
        } else {
            return Err(Error::report_parse(lineno, "path line outside of Instance/Singletons region"));
        }
    }

    flush_instance(&mut pending_instance, &mut current_instances);
    if !current_instances.is_empty() || !current_singletons.is_empty() {
        sets.push(ReportSet { instances: current_instances, singletons: current_singletons });
    }

    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_and_unescapes_round_trip() {
        let literal = PathLiteral::Text("a b\tc\nd\\e".to_string());
        let formatted = format_path(&literal);
        let parsed = parse_path_literal(&formatted).unwrap();
        assert_eq!(parsed, literal);
    }

    #[test]
    fn accepts_byte_prefixed_literal() {
        let literal = PathLiteral::Bytes(vec![0x61, 0xFF, 0x00]);
        let formatted = format_path(&literal);
        assert!(formatted.starts_with("b\""));
        let parsed = parse_path_literal(&formatted).unwrap();
        assert_eq!(parsed, literal);
    }

    #[test]
    fn parses_set_instance_singletons_grammar() {
        let report = "Set\nInstance\n  \"/a/one\"\n  \"/a/two\"\nSingletons\n  \"/a/three\"\n\n";
        let sets = parse_report(std::io::Cursor::new(report)).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].instances.len(), 1);
        assert_eq!(sets[0].instances[0].paths.len(), 2);
        assert_eq!(sets[0].singletons.len(), 1);
    }

    #[test]
    fn skips_comment_lines() {
        let report = "# a comment\nSet\nInstance\n  \"/a\"\n  \"/b\"\n\n";
        let sets = parse_report(std::io::Cursor::new(report)).unwrap();
        assert_eq!(sets.len(), 1);
    }
}
