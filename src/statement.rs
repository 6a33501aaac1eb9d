//! Statements and translation candidates.

use std::fmt;

use crate::validator::TERMINATOR;

/// A query-language statement, trimmed of surrounding whitespace.
///
/// Statements are never modified in place; [`Statement::terminated`]
/// returns a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement(String);

impl Statement {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(text.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Lower-cased form used for keyword dispatch.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    /// First whitespace-delimited word, lower-cased.
    pub fn leading_keyword(&self) -> String {
        self.0
            .split_whitespace()
            .next()
            .map(str::to_lowercase)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the terminator appears anywhere in the text.
    pub fn has_terminator(&self) -> bool {
        self.0.contains(TERMINATOR)
    }

    pub fn ends_with_terminator(&self) -> bool {
        self.0.ends_with(TERMINATOR)
    }

    /// A copy of this statement with the terminator appended.
    pub fn terminated(&self) -> Self {
        let mut text = self.0.clone();
        text.push(TERMINATOR);
        Self(text)
    }

    /// Whether the store should return rows for this statement.
    pub fn is_read(&self) -> bool {
        self.normalized().starts_with("select")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Statement {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Statement {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Which translator produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    RuleBased,
    Model,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::RuleBased => write!(f, "rules"),
            Origin::Model => write!(f, "model"),
        }
    }
}

/// A statement generated from a natural-language question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationCandidate {
    pub question: String,
    pub statement: Statement,
    pub origin: Origin,
}

impl TranslationCandidate {
    pub fn new(question: impl Into<String>, statement: impl Into<Statement>, origin: Origin) -> Self {
        Self {
            question: question.into(),
            statement: statement.into(),
            origin,
        }
    }
}
