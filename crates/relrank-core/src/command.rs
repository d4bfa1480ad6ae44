//! # Command Stream
//!
//! Line-oriented command parsing for the relrank index.
//!
//! - One command per line: a verb followed by double-quoted names
//! - Names are taken verbatim between quotes; no escaping exists
//! - Malformed lines are rejected, never guessed at
//! - Blank lines are skipped; the `end` line terminates the stream

use crate::RelrankError;
use crate::primitives::{
    END_MARKER, MAX_NAME_LENGTH, VERB_ADD_ENTITY, VERB_ADD_RELATION, VERB_DELETE_ENTITY,
    VERB_DELETE_RELATION, VERB_REPORT,
};
use std::fmt;
use std::io::BufRead;

// =============================================================================
// COMMAND
// =============================================================================

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `addent "name"`
    AddEntity(String),
    /// `delent "name"`
    DeleteEntity(String),
    /// `addrel "sender" "recipient" "relation"`
    AddRelation {
        sender: String,
        recipient: String,
        relation: String,
    },
    /// `delrel "sender" "recipient" "relation"`
    DeleteRelation {
        sender: String,
        recipient: String,
        relation: String,
    },
    /// `report`
    Report,
    /// `end`
    End,
}

impl Command {
    /// The verb this command is written with.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::AddEntity(_) => VERB_ADD_ENTITY,
            Self::DeleteEntity(_) => VERB_DELETE_ENTITY,
            Self::AddRelation { .. } => VERB_ADD_RELATION,
            Self::DeleteRelation { .. } => VERB_DELETE_RELATION,
            Self::Report => VERB_REPORT,
            Self::End => END_MARKER,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddEntity(name) | Self::DeleteEntity(name) => {
                write!(f, "{} \"{name}\"", self.verb())
            }
            Self::AddRelation {
                sender,
                recipient,
                relation,
            }
            | Self::DeleteRelation {
                sender,
                recipient,
                relation,
            } => write!(
                f,
                "{} \"{sender}\" \"{recipient}\" \"{relation}\"",
                self.verb()
            ),
            Self::Report | Self::End => f.write_str(self.verb()),
        }
    }
}

// =============================================================================
// LINE PARSER
// =============================================================================

/// Limits applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Maximum byte length of a single name.
    pub max_name_length: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_name_length: MAX_NAME_LENGTH,
        }
    }
}

fn malformed(line: usize, reason: &str) -> RelrankError {
    RelrankError::MalformedCommand {
        line,
        reason: reason.to_string(),
    }
}

/// Split the argument part of a line into its quoted names.
fn quoted_names<'a>(
    args: &'a str,
    line: usize,
    limits: &ParseLimits,
) -> Result<Vec<&'a str>, RelrankError> {
    let mut names = Vec::new();
    let mut remaining = args.trim_start();

    while !remaining.is_empty() {
        let Some(body) = remaining.strip_prefix('"') else {
            return Err(malformed(line, "expected a double-quoted name"));
        };
        let Some((name, after)) = body.split_once('"') else {
            return Err(malformed(line, "unterminated quoted name"));
        };
        if name.is_empty() {
            return Err(malformed(line, "empty name"));
        }
        if name.len() > limits.max_name_length {
            return Err(RelrankError::NameTooLong {
                line,
                len: name.len(),
                max: limits.max_name_length,
            });
        }
        if !after.is_empty() && !after.starts_with(char::is_whitespace) {
            return Err(malformed(line, "names must be separated by whitespace"));
        }
        names.push(name);
        remaining = after.trim_start();
    }

    Ok(names)
}

/// Parse one line. Returns `Ok(None)` for a blank line.
pub fn parse_line(
    text: &str,
    line: usize,
    limits: &ParseLimits,
) -> Result<Option<Command>, RelrankError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (verb, args) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let names = quoted_names(args, line, limits)?;

    let command = match (verb, names.as_slice()) {
        (VERB_ADD_ENTITY, [name]) => Command::AddEntity((*name).to_owned()),
        (VERB_DELETE_ENTITY, [name]) => Command::DeleteEntity((*name).to_owned()),
        (VERB_ADD_RELATION, [sender, recipient, relation]) => Command::AddRelation {
            sender: (*sender).to_owned(),
            recipient: (*recipient).to_owned(),
            relation: (*relation).to_owned(),
        },
        (VERB_DELETE_RELATION, [sender, recipient, relation]) => Command::DeleteRelation {
            sender: (*sender).to_owned(),
            recipient: (*recipient).to_owned(),
            relation: (*relation).to_owned(),
        },
        (VERB_REPORT, []) => Command::Report,
        (END_MARKER, []) => Command::End,
        (VERB_ADD_ENTITY | VERB_DELETE_ENTITY, _) => {
            return Err(malformed(line, "expected exactly one name"));
        }
        (VERB_ADD_RELATION | VERB_DELETE_RELATION, _) => {
            return Err(malformed(line, "expected sender, recipient and relation names"));
        }
        (VERB_REPORT | END_MARKER, _) => {
            return Err(malformed(line, "takes no arguments"));
        }
        _ => return Err(malformed(line, &format!("unknown verb '{verb}'"))),
    };

    Ok(Some(command))
}

// =============================================================================
// STREAM READER
// =============================================================================

/// Iterator over the commands of a line-oriented stream.
///
/// Stops after the end marker, at end of input, or after the first error.
/// The end marker itself is not yielded.
pub struct CommandReader<R> {
    input: R,
    limits: ParseLimits,
    buf: String,
    line: usize,
    saw_end_marker: bool,
    done: bool,
}

impl<R: BufRead> CommandReader<R> {
    /// Create a reader with default limits.
    pub fn new(input: R) -> Self {
        Self::with_limits(input, ParseLimits::default())
    }

    pub fn with_limits(input: R, limits: ParseLimits) -> Self {
        Self {
            input,
            limits,
            buf: String::new(),
            line: 0,
            saw_end_marker: false,
            done: false,
        }
    }

    /// Whether the stream was terminated by the end marker.
    #[must_use]
    pub fn saw_end_marker(&self) -> bool {
        self.saw_end_marker
    }

    /// Number of lines consumed so far.
    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for CommandReader<R> {
    type Item = Result<Command, RelrankError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.input.read_line(&mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line += 1;
                    match parse_line(&self.buf, self.line, &self.limits) {
                        Ok(None) => {}
                        Ok(Some(Command::End)) => {
                            self.saw_end_marker = true;
                            self.done = true;
                        }
                        Ok(Some(command)) => return Some(Ok(command)),
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Option<Command>, RelrankError> {
        parse_line(text, 1, &ParseLimits::default())
    }

    #[test]
    fn parses_every_verb() {
        assert_eq!(
            parse("addent \"alice\"\n").expect("parse"),
            Some(Command::AddEntity("alice".into()))
        );
        assert_eq!(
            parse("delent \"alice\"").expect("parse"),
            Some(Command::DeleteEntity("alice".into()))
        );
        assert_eq!(
            parse("addrel \"a\" \"b\" \"friend_of\"").expect("parse"),
            Some(Command::AddRelation {
                sender: "a".into(),
                recipient: "b".into(),
                relation: "friend_of".into(),
            })
        );
        assert!(matches!(
            parse("delrel \"a\" \"b\" \"r\"").expect("parse"),
            Some(Command::DeleteRelation { .. })
        ));
        assert_eq!(parse("report").expect("parse"), Some(Command::Report));
        assert_eq!(parse("end\r\n").expect("parse"), Some(Command::End));
    }

    #[test]
    fn blank_line_is_skipped() {
        assert_eq!(parse("   \n").expect("parse"), None);
    }

    #[test]
    fn names_may_contain_spaces() {
        assert_eq!(
            parse("addent \"new york\"").expect("parse"),
            Some(Command::AddEntity("new york".into()))
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            "frobnicate \"a\"",
            "addent",
            "addent a",
            "addent \"a",
            "addent \"a\" \"b\"",
            "addrel \"a\" \"b\"",
            "report \"x\"",
            "addent \"\"",
            "addrel \"a\"\"b\" \"r\"",
        ] {
            assert!(
                matches!(parse(line), Err(RelrankError::MalformedCommand { .. })),
                "expected rejection of {line:?}"
            );
        }
    }

    #[test]
    fn rejects_overlong_names() {
        let limits = ParseLimits { max_name_length: 3 };
        let result = parse_line("addent \"abcd\"", 7, &limits);
        assert!(matches!(
            result,
            Err(RelrankError::NameTooLong {
                line: 7,
                len: 4,
                max: 3
            })
        ));
    }

    #[test]
    fn display_matches_input_form() {
        let line = "addrel \"a\" \"b\" \"r\"";
        let command = parse(line).expect("parse").expect("command");
        assert_eq!(command.to_string(), line);
        assert_eq!(Command::Report.to_string(), "report");
    }

    #[test]
    fn reader_stops_at_end_marker() {
        let input = "addent \"a\"\n\nreport\nend\naddent \"b\"\n";
        let mut reader = CommandReader::new(input.as_bytes());
        let commands: Vec<Command> = reader.by_ref().map(|c| c.expect("command")).collect();
        assert_eq!(
            commands,
            vec![Command::AddEntity("a".into()), Command::Report]
        );
        assert!(reader.saw_end_marker());
        assert_eq!(reader.lines_read(), 4);
    }

    #[test]
    fn reader_tolerates_missing_end_marker() {
        let mut reader = CommandReader::new("report\n".as_bytes());
        assert_eq!(reader.next().map(|c| c.is_ok()), Some(true));
        assert!(reader.next().is_none());
        assert!(!reader.saw_end_marker());
    }

    #[test]
    fn reader_stops_after_error() {
        let mut reader = CommandReader::new("bogus\nreport\n".as_bytes());
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }
}
