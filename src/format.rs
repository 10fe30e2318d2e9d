use crate::record::LogRecord;
use std::fmt::Write;

/// Template used when none is configured.
pub const DEFAULT_FORMAT: &str = "[%D %T] [%L] (%S) %M";

/// Turns a [`LogRecord`] into the single text line that gets cached and shipped.
pub trait LineFormatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Time,
    ShortTime,
    Date,
    ShortDate,
    Level,
    Source,
    Message,
}

/// Formatter driven by a `%`-verb template.
///
/// Supported verbs:
/// - `%T` time (`15:04:05 UTC`), `%t` short time (`15:04`)
/// - `%D` date (`2006/01/02`), `%d` short date (`01/02/06`)
/// - `%L` level, `%S` source (the record target), `%M` message
/// - `%%` a literal percent sign
///
/// Unknown verbs are dropped; the text after them is kept.
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    pieces: Vec<Piece>,
}

impl PatternFormatter {
    pub fn new(template: &str) -> Self {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let piece = match chars.next() {
                Some('T') => Piece::Time,
                Some('t') => Piece::ShortTime,
                Some('D') => Piece::Date,
                Some('d') => Piece::ShortDate,
                Some('L') => Piece::Level,
                Some('S') => Piece::Source,
                Some('M') => Piece::Message,
                Some('%') | None => {
                    literal.push('%');
                    continue;
                }
                Some(_) => continue,
            };
            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(piece);
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        PatternFormatter { pieces }
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        PatternFormatter::new(DEFAULT_FORMAT)
    }
}

impl LineFormatter for PatternFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(64 + record.message.as_ref().map_or(0, |m| m.len()));
        let ts = &record.timestamp;

        for piece in &self.pieces {
            // Writing into a String cannot fail.
            let _ = match piece {
                Piece::Literal(text) => out.write_str(text),
                Piece::Time => write!(out, "{}", ts.format("%H:%M:%S UTC")),
                Piece::ShortTime => write!(out, "{}", ts.format("%H:%M")),
                Piece::Date => write!(out, "{}", ts.format("%Y/%m/%d")),
                Piece::ShortDate => write!(out, "{}", ts.format("%m/%d/%y")),
                Piece::Level => out.write_str(&record.level),
                Piece::Source => out.write_str(&record.target),
                Piece::Message => write_message(&mut out, record),
            };
        }
        out
    }
}

fn write_message(out: &mut String, record: &LogRecord) -> std::fmt::Result {
    if let Some(message) = &record.message {
        return out.write_str(message);
    }
    for (i, (key, value)) in record.fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        match value {
            serde_json::Value::String(s) => write!(out, "{}={}", key, s)?,
            other => write!(out, "{}={}", key, other)?,
        }
    }
    Ok(())
}

/// Formatter that emits the whole record as one compact JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl LineFormatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> String {
        serde_json::to_string(record)
            .unwrap_or_else(|_| record.message.clone().unwrap_or_default())
    }
}
