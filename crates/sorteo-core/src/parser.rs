// Line parser: pasted text -> ordered participants.
//
// Each non-empty line becomes one participant. A line goes through two
// stages: a leading list marker ("1.", "10)", "3 -", "•") is stripped, then a
// trailing identifier ("- 12345", "(544)", "[123.456]") is split off the
// name if one is present.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::config::{ConfigError, ParserConfig};
use crate::participant::{Participant, ParticipantId};

/// Default shortest digit run that counts as a trailing identifier.
pub const MIN_IDENTIFIER_DIGITS: usize = 3;

/// Characters allowed after a leading list number (whitespace is also allowed).
pub const LIST_NUMBER_SEPARATORS: &[char] = &['.', ')', '-'];

/// Single-character bullets stripped from the start of a line.
pub const BULLETS: &[char] = &['-', '*', '•'];

/// Characters that may separate a name from its trailing identifier
/// (whitespace is also allowed).
pub const NAME_IDENTIFIER_SEPARATORS: &[char] = &['-', '.', '|', ':', '(', '['];

/// Optional bracket closing a trailing identifier.
pub const CLOSING_BRACKETS: &[char] = &[')', ']'];

/// Separator allowed inside an identifier digit run; removed on extraction.
pub const IDENTIFIER_DIGIT_SEPARATOR: char = '.';

lazy_static! {
    static ref DEFAULT_PARSER: LineParser = LineParser::new(&ParserConfig::default())
        .expect("default parser patterns are valid");
}

/// Name and identifier split out of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFields {
    pub name: String,
    /// Empty when the line carries no trailing identifier.
    pub identifier: String,
}

/// Parser with compiled marker and identifier patterns.
#[derive(Debug, Clone)]
pub struct LineParser {
    marker: Regex,
    identifier: Regex,
    min_identifier_digits: usize,
}

impl Default for LineParser {
    fn default() -> Self {
        DEFAULT_PARSER.clone()
    }
}

impl LineParser {
    pub fn new(config: &ParserConfig) -> Result<Self, ConfigError> {
        let digits = config.min_identifier_digits;
        if digits == 0 {
            return Err(ConfigError::ValidationError {
                field: "parser.min_identifier_digits".into(),
                message: "must be greater than 0".into(),
            });
        }

        let marker = format!(
            r"^(?:[0-9]+{}+|{})\s*",
            char_class(LIST_NUMBER_SEPARATORS, true),
            char_class(BULLETS, false),
        );
        // At least `digits` digits in a row, then any run of digits and
        // separators. "12.345.678" therefore splits after "12".
        let sep = regex::escape(&IDENTIFIER_DIGIT_SEPARATOR.to_string());
        let identifier = format!(
            r"^(.*?){}+([0-9]{{{},}}[0-9{sep}]*){}?$",
            char_class(NAME_IDENTIFIER_SEPARATORS, true),
            digits,
            char_class(CLOSING_BRACKETS, false),
        );

        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigError::ValidationError {
                field: "parser.min_identifier_digits".into(),
                message: format!("cannot build line pattern: {e}"),
            })
        };

        Ok(LineParser {
            marker: compile(&marker)?,
            identifier: compile(&identifier)?,
            min_identifier_digits: digits,
        })
    }

    pub fn min_identifier_digits(&self) -> usize {
        self.min_identifier_digits
    }

    /// Parse `raw_text` into participants, one per non-empty line, in input
    /// order. Returns an empty vector when every line is blank.
    pub fn parse(&self, raw_text: &str) -> Vec<Participant> {
        let batch = uuid::Uuid::new_v4();

        let participants: Vec<Participant> = raw_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(index, line)| {
                let fields = self.parse_line(line);
                Participant::new(
                    ParticipantId::new(index, &batch),
                    line,
                    fields.name,
                    fields.identifier,
                )
            })
            .collect();

        let with_identifier = participants.iter().filter(|p| p.has_identifier()).count();
        debug!(
            "Parsed {} participants ({} with identifier)",
            participants.len(),
            with_identifier
        );

        participants
    }

    /// Run both stages on a single, already trimmed line.
    pub fn parse_line(&self, line: &str) -> LineFields {
        self.extract_identifier(self.strip_list_marker(line))
    }

    /// Strip one leading list number or bullet, plus the whitespace after it.
    pub fn strip_list_marker<'a>(&self, line: &'a str) -> &'a str {
        let line = line.trim();
        match self.marker.find(line) {
            Some(m) => line[m.end()..].trim(),
            None => line,
        }
    }

    /// Split a trailing identifier off `line`. Without one the whole line is
    /// the name.
    pub fn extract_identifier(&self, line: &str) -> LineFields {
        match self.identifier.captures(line) {
            Some(caps) => {
                let name = caps.get(1).map_or("", |m| m.as_str()).trim();
                let identifier: String = caps
                    .get(2)
                    .map_or("", |m| m.as_str())
                    .chars()
                    .filter(|c| *c != IDENTIFIER_DIGIT_SEPARATOR)
                    .collect();
                LineFields {
                    name: name.to_string(),
                    identifier,
                }
            }
            None => LineFields {
                name: line.to_string(),
                identifier: String::new(),
            },
        }
    }
}

/// Parse with the default parser settings.
pub fn parse(raw_text: &str) -> Vec<Participant> {
    DEFAULT_PARSER.parse(raw_text)
}

fn char_class(chars: &[char], with_whitespace: bool) -> String {
    let mut class = String::from("[");
    if with_whitespace {
        class.push_str(r"\s");
    }
    for c in chars {
        class.push_str(&regex::escape(&c.to_string()));
    }
    class.push(']');
    class
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
