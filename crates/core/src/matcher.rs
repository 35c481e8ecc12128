//! Frame classification
//!
//! Each inbound line is checked against an ordered list of rules. The
//! first rule whose pattern matches wins, so overlapping patterns must be
//! registered most-specific-first; no other tie-breaking happens.

use regex::Regex;

use crate::error::Result;

/// Sender tag shared by the chat frame patterns (8-4-4-4-12 ASCII word groups)
const SENDER_TAG: &str =
    r"^:[0-9A-Za-z_]{8}-[0-9A-Za-z_]{4}-[0-9A-Za-z_]{4}-[0-9A-Za-z_]{4}-[0-9A-Za-z_]{12}";

/// Event a frame is classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A chat message: captures (sender handle, JSON payload)
    Message,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Message => "message",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (event, pattern) registration
#[derive(Debug, Clone)]
pub struct EventRule {
    pub event: EventKind,
    pub pattern: Regex,
}

/// Result of a successful classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMatch<'a> {
    pub event: EventKind,
    /// Capture groups in order, excluding the whole-match group.
    /// Groups that did not participate are empty.
    pub fields: Vec<&'a str>,
}

impl<'a> FrameMatch<'a> {
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.fields.get(index).copied()
    }
}

/// Ordered rule list, scanned linearly
#[derive(Debug, Clone, Default)]
pub struct FrameMatcher {
    rules: Vec<EventRule>,
}

impl FrameMatcher {
    /// Create a matcher with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Matcher with the chat room's message rules (`MSG` and `AMSG`)
    pub fn kakao() -> Result<Self> {
        let mut matcher = Self::new();
        matcher.register(
            EventKind::Message,
            &format!("{} MSG ([^ ]+) ALL NORMAL (.*)$", SENDER_TAG),
        )?;
        matcher.register(
            EventKind::Message,
            &format!("{} AMSG ([^ ]+) ALL NORMAL (.*)$", SENDER_TAG),
        )?;
        Ok(matcher)
    }

    /// Append a rule. Rules are scanned in registration order.
    pub fn register(&mut self, event: EventKind, pattern: &str) -> Result<()> {
        self.rules.push(EventRule {
            event,
            pattern: Regex::new(pattern)?,
        });
        Ok(())
    }

    pub fn rules(&self) -> &[EventRule] {
        &self.rules
    }

    /// Classify a single line. Returns `None` when no rule matches.
    pub fn classify<'a>(&self, line: &'a str) -> Option<FrameMatch<'a>> {
        self.rules.iter().find_map(|rule| {
            let captures = rule.pattern.captures(line)?;
            let fields = captures
                .iter()
                .skip(1)
                .map(|group| group.map_or("", |m| m.as_str()))
                .collect();
            Some(FrameMatch {
                event: rule.event,
                fields,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSG_LINE: &str =
        r#":aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee MSG alice ALL NORMAL {"msg":"hi"}"#;

    #[test]
    fn test_classify_msg() {
        let matcher = FrameMatcher::kakao().unwrap();
        let found = matcher.classify(MSG_LINE).unwrap();

        assert_eq!(found.event, EventKind::Message);
        assert_eq!(found.field(0), Some("alice"));
        assert_eq!(found.field(1), Some(r#"{"msg":"hi"}"#));
    }

    #[test]
    fn test_classify_amsg() {
        let matcher = FrameMatcher::kakao().unwrap();
        let line = MSG_LINE.replace(" MSG ", " AMSG ");
        let found = matcher.classify(&line).unwrap();

        assert_eq!(found.event, EventKind::Message);
        assert_eq!(found.fields, vec!["alice", r#"{"msg":"hi"}"#]);
    }

    #[test]
    fn test_other_tokens_unmatched() {
        let matcher = FrameMatcher::kakao().unwrap();

        assert!(matcher.classify(&MSG_LINE.replace(" MSG ", " NOTICE ")).is_none());
        assert!(matcher.classify(&MSG_LINE.replace(" ALL ", " ONE ")).is_none());
        assert!(matcher.classify(&MSG_LINE.replace(" NORMAL ", " URGENT ")).is_none());
        assert!(matcher.classify("").is_none());
        assert!(matcher.classify("PING").is_none());
        // Sender tag must be anchored at the start of the line
        assert!(matcher.classify(&format!("x{}", MSG_LINE)).is_none());
        // Short sender tag
        assert!(matcher
            .classify(r#":aaaa-bbbb-cccc-dddd-eeeeeeeeeeee MSG alice ALL NORMAL {}"#)
            .is_none());
    }

    #[test]
    fn test_sender_tag_is_ascii_only() {
        let matcher = FrameMatcher::kakao().unwrap();

        let accented = MSG_LINE.replacen("aaaaaaaa", "aaaaaaa\u{e9}", 1);
        assert!(matcher.classify(&accented).is_none());

        let hangul = MSG_LINE.replacen("bbbb", "\u{d55c}\u{ae00}bb", 1);
        assert!(matcher.classify(&hangul).is_none());

        let mixed = MSG_LINE.replacen("eeeeeeeeeeee", "0123456789AB", 1);
        assert!(matcher.classify(&mixed).is_some());
    }

    #[test]
    fn test_first_rule_wins() {
        let mut matcher = FrameMatcher::new();
        matcher.register(EventKind::Message, r"^(a)(b)?").unwrap();
        matcher.register(EventKind::Message, r"^(ab)").unwrap();

        let found = matcher.classify("ab").unwrap();
        assert_eq!(found.fields, vec!["a", "b"]);

        let found = matcher.classify("ac").unwrap();
        assert_eq!(found.fields, vec!["a", ""]);
        assert_eq!(matcher.rules().len(), 2);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut matcher = FrameMatcher::new();
        assert!(matcher.register(EventKind::Message, "(unclosed").is_err());
        assert!(matcher.rules().is_empty());
    }
}
