//! Tolerant parser for one payment record per line.
//!
//! A record is an object-like line holding exactly three quoted string
//! pairs, keyed `created_time`, `actor` and `target`, in any order:
//!
//! ```text
//! {"created_time": "2014-03-01T00:00:59Z", "target": "Jamie-Korn", "actor": "Jordan-Gruber"}
//! ```
//!
//! Spaces and tabs may surround the `:` and `,` separators and the braces.
//! Values are taken verbatim between their quotes; escapes are not
//! interpreted. A leading byte order mark is skipped, and only whitespace
//! may follow the closing brace.

use paygraph_types::{Payment, TimestampError, parse_timestamp};

/// Key carrying the payment timestamp.
pub const CREATED_TIME_KEY: &str = "created_time";
/// Key carrying the paying actor.
pub const ACTOR_KEY: &str = "actor";
/// Key carrying the paid actor.
pub const TARGET_KEY: &str = "target";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Why a line could not be turned into a [`Payment`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRecord {
    /// A `"` was expected at the given byte offset.
    #[error("expected '\"' at byte {position}")]
    ExpectedQuote {
        /// Byte offset into the line.
        position: usize,
    },

    /// A quoted string was opened but never closed.
    #[error("unterminated string starting at byte {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// A key was not followed by a `:` separator.
    #[error("expected ':' after key {key:?}")]
    MissingColon {
        /// The key that lacks its separator.
        key: String,
    },

    /// A key other than the three known keys appeared.
    #[error("unknown key {0:?}")]
    UnknownKey(String),

    /// A known key appeared more than once.
    #[error("duplicate key {0:?}")]
    DuplicateKey(&'static str),

    /// A known key never appeared.
    #[error("missing key {0:?}")]
    MissingKey(&'static str),

    /// An actor or target value was empty.
    #[error("empty value for key {0:?}")]
    EmptyValue(&'static str),

    /// The actor and target are the same id, which cannot form an edge.
    #[error("actor and target are both {0:?}")]
    SelfPayment(String),

    /// Non-blank text followed the third pair.
    #[error("unexpected trailing input at byte {position}")]
    TrailingInput {
        /// Byte offset of the first unexpected byte.
        position: usize,
    },

    /// The timestamp value is not an absolute date-time.
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

/// Byte cursor over one line.
struct Scanner<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    const fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.line.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos = self.pos.saturating_add(1);
    }

    /// Skip blanks plus any of the given punctuation bytes.
    ///
    /// Returns whether any punctuation byte was consumed.
    fn skip(&mut self, punctuation: &[u8]) -> bool {
        let mut seen = false;
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' {
                self.bump();
            } else if punctuation.contains(&b) {
                seen = true;
                self.bump();
            } else {
                break;
            }
        }
        seen
    }

    /// Read one `"..."` string and return its contents.
    fn quoted(&mut self) -> Result<&'a str, MalformedRecord> {
        let open = self.pos;
        if self.peek() != Some(b'"') {
            return Err(MalformedRecord::ExpectedQuote { position: open });
        }
        self.bump();
        let start = self.pos;
        let rest = self
            .line
            .get(start..)
            .ok_or(MalformedRecord::UnterminatedString { position: open })?;
        let len = rest
            .find('"')
            .ok_or(MalformedRecord::UnterminatedString { position: open })?;
        let end = start.saturating_add(len);
        let value = self
            .line
            .get(start..end)
            .ok_or(MalformedRecord::UnterminatedString { position: open })?;
        self.pos = end.saturating_add(1);
        Ok(value)
    }
}

/// Values collected so far, one slot per known key.
#[derive(Default)]
struct Fields<'a> {
    created_time: Option<&'a str>,
    actor: Option<&'a str>,
    target: Option<&'a str>,
}

impl<'a> Fields<'a> {
    fn set(&mut self, key: &str, value: &'a str) -> Result<(), MalformedRecord> {
        let (slot, name) = match key {
            CREATED_TIME_KEY => (&mut self.created_time, CREATED_TIME_KEY),
            ACTOR_KEY => (&mut self.actor, ACTOR_KEY),
            TARGET_KEY => (&mut self.target, TARGET_KEY),
            other => return Err(MalformedRecord::UnknownKey(other.to_owned())),
        };
        if slot.is_some() {
            return Err(MalformedRecord::DuplicateKey(name));
        }
        *slot = Some(value);
        Ok(())
    }
}

/// Parse one record line into a [`Payment`].
///
/// # Errors
///
/// Returns [`MalformedRecord`] if the line does not hold the three required
/// pairs exactly once each, if actor or target is empty or identical, or if
/// the timestamp is not a valid date-time.
pub fn parse_record(line: &str) -> Result<Payment, MalformedRecord> {
    let mut scanner = Scanner::new(line);
    let mut fields = Fields::default();

    if line.starts_with(BYTE_ORDER_MARK) {
        scanner.pos = BYTE_ORDER_MARK.len_utf8();
    }

    scanner.skip(b"{");
    for index in 0..3 {
        if index > 0 {
            scanner.skip(b",");
        }
        let key = scanner.quoted()?;
        if !scanner.skip(b":") {
            return Err(MalformedRecord::MissingColon {
                key: key.to_owned(),
            });
        }
        let value = scanner.quoted()?;
        fields.set(key, value)?;
    }
    scanner.skip(b"}");
    let rest = line.get(scanner.pos..).unwrap_or_default();
    if let Some(offset) = rest.find(|c: char| !c.is_whitespace()) {
        return Err(MalformedRecord::TrailingInput {
            position: scanner.pos.saturating_add(offset),
        });
    }

    let created_time = fields
        .created_time
        .ok_or(MalformedRecord::MissingKey(CREATED_TIME_KEY))?;
    let actor = fields.actor.ok_or(MalformedRecord::MissingKey(ACTOR_KEY))?;
    let target = fields
        .target
        .ok_or(MalformedRecord::MissingKey(TARGET_KEY))?;

    if actor.is_empty() {
        return Err(MalformedRecord::EmptyValue(ACTOR_KEY));
    }
    if target.is_empty() {
        return Err(MalformedRecord::EmptyValue(TARGET_KEY));
    }
    if actor == target {
        return Err(MalformedRecord::SelfPayment(actor.to_owned()));
    }

    Ok(Payment::new(parse_timestamp(created_time)?, actor, target))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BASE: i64 = 1_393_632_000;

    fn at(seconds: i64) -> i64 {
        BASE.saturating_add(seconds)
    }

    #[test]
    fn parses_generator_layout() {
        let line = r#"{"created_time": "2014-03-01T00:00:59Z", "target": "Jamie-Korn", "actor": "Jordan-Gruber"}"#;
        assert_eq!(
            parse_record(line),
            Ok(Payment::new(at(59), "Jordan-Gruber", "Jamie-Korn")),
        );
    }

    #[test]
    fn any_key_order() {
        let orders = [
            r#"{"actor": "a", "target": "b", "created_time": "2014-03-01T00:00:10Z"}"#,
            r#"{"target": "b", "created_time": "2014-03-01T00:00:10Z", "actor": "a"}"#,
            r#"{"created_time": "2014-03-01T00:00:10Z", "actor": "a", "target": "b"}"#,
        ];
        for line in orders {
            assert_eq!(parse_record(line), Ok(Payment::new(at(10), "a", "b")), "{line}");
        }
    }

    #[test]
    fn tolerates_tabs_and_spaces() {
        let line = "\t{ \"actor\"\t:  \"a\" ,\t\"target\" :\"b\",   \"created_time\":\t\"2014-03-01T00:00:10Z\"  }  ";
        assert_eq!(parse_record(line), Ok(Payment::new(at(10), "a", "b")));
    }

    #[test]
    fn compact_json_is_accepted() {
        let line = r#"{"created_time":"2014-03-01T00:00:10Z","target":"b","actor":"a"}"#;
        assert_eq!(parse_record(line), Ok(Payment::new(at(10), "a", "b")));
    }

    #[test]
    fn missing_pair_is_malformed() {
        let line = r#"{"actor": "a", "target": "b"}"#;
        assert_eq!(
            parse_record(line),
            Err(MalformedRecord::ExpectedQuote { position: 28 }),
        );
    }

    #[test]
    fn duplicate_key_is_malformed() {
        let line = r#"{"actor": "a", "actor": "b", "created_time": "2014-03-01T00:00:10Z"}"#;
        assert_eq!(
            parse_record(line),
            Err(MalformedRecord::DuplicateKey(ACTOR_KEY))
        );
    }

    #[test]
    fn unknown_key_is_malformed() {
        let line = r#"{"actor": "a", "payee": "b", "created_time": "2014-03-01T00:00:10Z"}"#;
        assert_eq!(
            parse_record(line),
            Err(MalformedRecord::UnknownKey("payee".to_owned()))
        );
    }

    #[test]
    fn unterminated_value_is_malformed() {
        assert_eq!(
            parse_record(r#"{"actor": "a"#),
            Err(MalformedRecord::UnterminatedString { position: 10 })
        );
    }

    #[test]
    fn missing_colon_is_malformed() {
        let line = r#"{"actor" "a", "target": "b", "created_time": "2014-03-01T00:00:10Z"}"#;
        assert_eq!(
            parse_record(line),
            Err(MalformedRecord::MissingColon {
                key: ACTOR_KEY.to_owned()
            })
        );
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let line = r#"{"actor": "a", "target": "b", "created_time": "not a time"}"#;
        assert!(matches!(
            parse_record(line),
            Err(MalformedRecord::Timestamp(_))
        ));
    }

    #[test]
    fn empty_and_self_payments_are_rejected() {
        let empty = r#"{"actor": "", "target": "b", "created_time": "2014-03-01T00:00:10Z"}"#;
        assert_eq!(
            parse_record(empty),
            Err(MalformedRecord::EmptyValue(ACTOR_KEY))
        );
        let own = r#"{"actor": "a", "target": "a", "created_time": "2014-03-01T00:00:10Z"}"#;
        assert_eq!(
            parse_record(own),
            Err(MalformedRecord::SelfPayment("a".to_owned()))
        );
    }

    #[test]
    fn trailing_input_is_rejected() {
        let line = r#"{"actor": "a", "target": "b", "created_time": "2014-03-01T00:00:10Z"} extra"#;
        assert!(matches!(
            parse_record(line),
            Err(MalformedRecord::TrailingInput { .. })
        ));
    }

    #[test]
    fn text_after_carriage_return_is_rejected() {
        let line = r#"{"actor": "a", "target": "b", "created_time": "2014-03-01T00:00:10Z"}"#;
        let junk = format!("{line} \r junk");
        assert_eq!(
            parse_record(&junk),
            Err(MalformedRecord::TrailingInput {
                position: line.len().saturating_add(3),
            })
        );
        assert!(parse_record(&format!("{line} \r\n")).is_ok());
    }

    #[test]
    fn leading_byte_order_mark_is_skipped() {
        let line = "\u{feff}{\"actor\": \"a\", \"target\": \"b\", \"created_time\": \"2014-03-01T00:00:10Z\"}";
        assert_eq!(parse_record(line), Ok(Payment::new(at(10), "a", "b")));
        assert_eq!(
            parse_record("\u{feff}"),
            Err(MalformedRecord::ExpectedQuote { position: 3 })
        );
    }

    #[test]
    fn empty_line_is_malformed() {
        assert_eq!(
            parse_record(""),
            Err(MalformedRecord::ExpectedQuote { position: 0 })
        );
    }
}
