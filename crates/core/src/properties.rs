//! Java-style `.properties` files
//!
//! Android projects keep signing material in `key.properties` and framework
//! values in `local.properties`. Both use the `java.util.Properties` text
//! format:
//!
//! - `#` and `!` start a comment line
//! - the key ends at the first unescaped `=`, `:` or whitespace
//! - a trailing odd run of backslashes joins the next line
//! - `\t`, `\n`, `\r`, `\f`, `\\` and `\uXXXX` escapes are decoded
//!
//! Files are read as UTF-8. Content that is not valid UTF-8 is read as
//! ISO-8859-1, the encoding `Properties.load(InputStream)` assumes.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors produced while parsing properties text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertiesError {
    /// `\u` not followed by four hex digits
    #[error("malformed \\uXXXX escape on line {line}")]
    MalformedUnicodeEscape {
        /// 1-based line where the logical line starts
        line: usize,
    },

    /// `\uXXXX` naming a surrogate that is not part of a valid pair
    #[error("unpaired surrogate \\u{code:04x} on line {line}")]
    InvalidScalar {
        /// 1-based line where the logical line starts
        line: usize,
        /// The decoded code unit
        code: u32,
    },
}

impl From<PropertiesError> for Error {
    fn from(err: PropertiesError) -> Self {
        Error::properties(err.to_string()).with_source(err)
    }
}

/// Parsed key/value pairs from a `.properties` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Create an empty set of properties
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties text
    pub fn parse(input: &str) -> std::result::Result<Self, PropertiesError> {
        let mut entries = BTreeMap::new();

        for (line_no, logical) in logical_lines(input) {
            let (raw_key, raw_value) = split_key_value(&logical);
            let key = unescape(raw_key, line_no)?;
            let value = unescape(raw_value, line_no)?;
            entries.insert(key, value);
        }

        Ok(Self { entries })
    }

    /// Parse raw bytes as UTF-8, or as ISO-8859-1 when they are not UTF-8
    pub fn parse_bytes(bytes: &[u8]) -> std::result::Result<Self, PropertiesError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::parse(text),
            Err(e) => {
                tracing::warn!(
                    offset = e.valid_up_to(),
                    "Properties are not valid UTF-8; reading as ISO-8859-1"
                );
                let text: String = bytes.iter().map(|&b| char::from(b)).collect();
                Self::parse(&text)
            }
        }
    }

    /// Read and parse a properties file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::from(e).with_context(format!("Reading {}", path.display()))
        })?;

        Self::parse_bytes(&bytes).map_err(|e| {
            Error::from(e)
                .with_context(format!("Parsing {}", path.display()))
                .with_suggestion("Use one `key=value` pair per line")
        })
    }

    /// Read a properties file if it exists, returning `None` otherwise
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.is_file() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up a value, treating blank values as absent
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as properties text, one escaped `key=value` per line
    pub fn to_properties_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        out
    }
}

impl FromIterator<(String, String)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Count the trailing backslashes of a line
fn trailing_backslashes(line: &str) -> usize {
    line.chars().rev().take_while(|&c| c == '\\').count()
}

/// Join physical lines into logical lines, dropping comments and blanks.
///
/// Yields the 1-based number of the first physical line of each entry.
fn logical_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, physical) in input.lines().enumerate() {
        let physical = physical.strip_suffix('\r').unwrap_or(physical);
        let trimmed = physical.trim_start_matches(is_blank);

        let (start, mut buf) = match current.take() {
            Some(pending) => pending,
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (idx + 1, String::new())
            }
        };

        if trailing_backslashes(trimmed) % 2 == 1 {
            buf.push_str(&trimmed[..trimmed.len() - 1]);
            current = Some((start, buf));
        } else {
            buf.push_str(trimmed);
            lines.push((start, buf));
        }
    }

    // A continuation on the final line ends the entry as-is
    if let Some((start, buf)) = current {
        if !buf.is_empty() {
            lines.push((start, buf));
        }
    }

    lines
}

/// Split a logical line at its first unescaped separator
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut value_start = line.len();

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                value_start = i + 1;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                let rest = line[i..].trim_start_matches(is_blank);
                let mut offset = line.len() - rest.len();
                if rest.starts_with('=') || rest.starts_with(':') {
                    offset += 1;
                }
                value_start = offset;
                break;
            }
            _ => {}
        }
    }

    let value = line[value_start..].trim_start_matches(is_blank);
    (&line[..key_end], value)
}

fn unescape(raw: &str, line: usize) -> std::result::Result<String, PropertiesError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let code = unicode_escape(&mut chars, line)?;
                let ch = if HIGH_SURROGATES.contains(&code) {
                    // A high surrogate only decodes together with `\uDC00..\uDFFF`
                    let mut lookahead = chars.clone();
                    match (lookahead.next(), lookahead.next()) {
                        (Some('\\'), Some('u')) => {
                            let low = unicode_escape(&mut lookahead, line)?;
                            if LOW_SURROGATES.contains(&low) {
                                chars = lookahead;
                                char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00))
                            } else {
                                None
                            }
                        }
                        _ => None,
                    }
                } else {
                    char::from_u32(code)
                };
                out.push(ch.ok_or(PropertiesError::InvalidScalar { line, code })?);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

const HIGH_SURROGATES: std::ops::Range<u32> = 0xD800..0xDC00;
const LOW_SURROGATES: std::ops::Range<u32> = 0xDC00..0xE000;

/// Read the four hex digits following `\u`
fn unicode_escape(
    chars: &mut std::str::Chars<'_>,
    line: usize,
) -> std::result::Result<u32, PropertiesError> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
        return Err(PropertiesError::MalformedUnicodeEscape { line });
    }
    u32::from_str_radix(&hex, 16).map_err(|_| PropertiesError::MalformedUnicodeEscape { line })
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
