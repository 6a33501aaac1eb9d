//! Structural statement validator using nom.
//!
//! Checks a statement against a minimal grammar and classifies failures.
//!
//! # Accepted SELECT shape
//!
//! ```text
//! select <targets> from <source> [where <predicate>] [group by <grouping>] [order by <ordering>] ;
//! ```
//!
//! Keywords must be surrounded by whitespace and segments stay on one
//! line. The target list and source may be empty when whitespace still
//! separates the keywords (`select * from ;`). An optional clause keyword
//! with nothing after it is rejected.
//! `insert`, `update`, `delete` and any other statement only need the
//! terminator.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace1},
    combinator::{eof, opt, value},
    error::{Error as NomError, ErrorKind as NomErrorKind},
    sequence::tuple,
    IResult,
};

use crate::error::ErrorKind;

/// The statement terminator.
pub const TERMINATOR: char = ';';

const FROM: &str = "from";
const WHERE: &str = "where";
const GROUP_BY: &str = "group by";
const ORDER_BY: &str = "order by";

/// Outcome of validating one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid { kind: ErrorKind, message: String },
}

impl ValidationResult {
    fn invalid(kind: ErrorKind, message: &str) -> Self {
        Self::Invalid {
            kind,
            message: message.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Valid => None,
            Self::Invalid { kind, .. } => Some(*kind),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { message, .. } => Some(message),
        }
    }
}

/// Segments of a SELECT that matched the accepted shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectShape<'a> {
    pub targets: &'a str,
    pub source: &'a str,
    pub predicate: Option<&'a str>,
    pub grouping: Option<&'a str>,
    pub ordering: Option<&'a str>,
}

/// Validate a statement. Pure and total: every input maps to a result.
pub fn validate(text: &str) -> ValidationResult {
    let query = text.trim().to_lowercase();

    if !query.ends_with(TERMINATOR) {
        return ValidationResult::invalid(
            ErrorKind::SyntaxError,
            "statement must end with a terminator",
        );
    }

    if query.starts_with("select") {
        return validate_select(&query);
    }

    // insert, update, delete and anything else: the terminator is enough.
    ValidationResult::Valid
}

fn validate_select(query: &str) -> ValidationResult {
    if !query.contains(FROM) {
        return ValidationResult::invalid(ErrorKind::MissingClause, "SELECT requires a FROM clause");
    }

    match select_shape(query) {
        Some(_) => ValidationResult::Valid,
        None => ValidationResult::invalid(ErrorKind::SyntaxError, "malformed SELECT"),
    }
}

/// Match a lower-cased, terminated SELECT against the accepted shape.
pub fn select_shape(query: &str) -> Option<SelectShape<'_>> {
    match parse_select(query) {
        Ok((_, shape)) => Some(shape),
        Err(_) => None,
    }
}

fn parse_select(input: &str) -> IResult<&str, SelectShape<'_>> {
    let (input, _) = tag("select")(input)?;
    let (input, targets) = spaced_segment(input, &[FROM])?;
    let (input, _) = tuple((multispace1, tag(FROM)))(input)?;
    let (input, source) = spaced_segment(input, &[WHERE, GROUP_BY, ORDER_BY])?;
    let (input, predicate) = opt(|i| clause(WHERE, &[GROUP_BY, ORDER_BY], i))(input)?;
    let (input, grouping) = opt(|i| clause(GROUP_BY, &[ORDER_BY], i))(input)?;
    let (input, ordering) = opt(|i| clause(ORDER_BY, &[], i))(input)?;
    let (input, _) = end_of_statement(input)?;

    Ok((
        input,
        SelectShape {
            targets,
            source,
            predicate,
            grouping,
            ordering,
        },
    ))
}

/// Parse `<ws> keyword <ws> <segment>`.
fn clause<'a>(kw: &'static str, stops: &[&str], input: &'a str) -> IResult<&'a str, &'a str> {
    let (input, _) = keyword(kw, input)?;
    segment(input, stops)
}

fn keyword<'a>(kw: &'static str, input: &'a str) -> IResult<&'a str, &'a str> {
    let (input, (_, kw, _)) = tuple((multispace1, tag(kw), multispace1))(input)?;
    Ok((input, kw))
}

/// Spaces or tabs, but not a line break.
fn inline_space0(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_whitespace() && c != '\n')(input)
}

/// Optional inline whitespace, the terminator, end of input.
fn end_of_statement(input: &str) -> IResult<&str, ()> {
    value((), tuple((inline_space0, char(TERMINATOR), eof)))(input)
}

/// True if `input` starts with `kw` followed by whitespace or the end of
/// the statement.
fn starts_with_keyword(input: &str, kw: &str) -> bool {
    let head: IResult<&str, &str> = tag(kw)(input);
    match head {
        Ok((rest, _)) => {
            let tail: IResult<&str, ()> = alt((value((), multispace1), end_of_statement))(rest);
            tail.is_ok()
        }
        Err(_) => false,
    }
}

/// Whitespace, then a keyword as in [`starts_with_keyword`]. A keyword right
/// before the terminator counts, so the clause that follows fails instead of
/// being absorbed into the previous segment.
fn at_keyword(input: &str, kw: &str) -> bool {
    let head: IResult<&str, &str> = multispace1(input);
    match head {
        Ok((rest, _)) => starts_with_keyword(rest, kw),
        Err(_) => false,
    }
}

/// Whitespace, then a segment that may be empty.
///
/// An empty segment needs whitespace on both sides: before the terminator
/// one run is enough, before a stop keyword the run must hold at least two
/// characters so the keyword keeps its own leading whitespace.
fn spaced_segment<'a>(input: &'a str, stops: &[&str]) -> IResult<&'a str, &'a str> {
    let (rest, gap) = multispace1(input)?;

    let terminated: IResult<&str, ()> = value((), tuple((char(TERMINATOR), eof)))(rest);
    if terminated.is_ok() {
        return Ok((rest, ""));
    }

    if let Some(last) = gap.chars().last() {
        let split = gap.len() - last.len_utf8();
        if split > 0 && stops.iter().any(|kw| starts_with_keyword(rest, kw)) {
            return Ok((&input[split..], ""));
        }
    }

    segment(rest, stops)
}

/// Take a non-empty, single-line segment up to the first stop keyword or
/// the terminator.
fn segment<'a>(input: &'a str, stops: &[&str]) -> IResult<&'a str, &'a str> {
    let fail = || nom::Err::Error(NomError::new(input, NomErrorKind::TakeUntil));

    if stops.iter().any(|kw| starts_with_keyword(input, kw)) {
        return Err(fail());
    }
    for (idx, ch) in input.char_indices().skip(1) {
        let rest = &input[idx..];
        if stops.iter().any(|kw| at_keyword(rest, kw)) || end_of_statement(rest).is_ok() {
            return Ok((rest, &input[..idx]));
        }
        if ch == '\n' {
            break;
        }
    }
    Err(fail())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kind_of(text: &str) -> Option<ErrorKind> {
        validate(text).kind()
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(validate("SELECT * FROM users;"), ValidationResult::Valid);
    }

    #[test]
    fn test_missing_terminator() {
        assert_eq!(
            validate("SELECT * FROM users"),
            ValidationResult::Invalid {
                kind: ErrorKind::SyntaxError,
                message: "statement must end with a terminator".to_string(),
            }
        );
        assert_eq!(kind_of("SELECT * WHERE x=1"), Some(ErrorKind::SyntaxError));
        assert_eq!(kind_of(""), Some(ErrorKind::SyntaxError));
        assert_eq!(kind_of("   "), Some(ErrorKind::SyntaxError));
    }

    #[test]
    fn test_missing_from() {
        assert_eq!(
            validate("SELECT * WHERE x=1;"),
            ValidationResult::Invalid {
                kind: ErrorKind::MissingClause,
                message: "SELECT requires a FROM clause".to_string(),
            }
        );
    }

    #[test]
    fn test_full_shape() {
        let q = "select device_name, count(*) as usage_count from usage_records join devices on usage_records.device_id = devices.device_id where devices.location = '客厅' group by devices.device_id order by usage_count;";
        let shape = select_shape(q).unwrap();
        assert_eq!(shape.targets, "device_name, count(*) as usage_count");
        assert_eq!(
            shape.source,
            "usage_records join devices on usage_records.device_id = devices.device_id"
        );
        assert_eq!(shape.predicate, Some("devices.location = '客厅'"));
        assert_eq!(shape.grouping, Some("devices.device_id"));
        assert_eq!(shape.ordering, Some("usage_count"));
        assert!(validate(q).is_valid());
    }

    #[test]
    fn test_optional_clauses_absent() {
        let shape = select_shape("select id from users ;").unwrap();
        assert_eq!(shape.source, "users");
        assert_eq!(shape.predicate, None);
        assert_eq!(shape.grouping, None);
        assert_eq!(shape.ordering, None);
    }

    #[test]
    fn test_empty_clause_rejected() {
        assert_eq!(kind_of("SELECT * FROM users WHERE;"), Some(ErrorKind::SyntaxError));
        assert_eq!(kind_of("SELECT * FROM users ORDER BY ;"), Some(ErrorKind::SyntaxError));
        assert_eq!(
            kind_of("SELECT * FROM users WHERE GROUP BY id;"),
            Some(ErrorKind::SyntaxError)
        );
    }

    #[test]
    fn test_malformed_select() {
        assert_eq!(
            validate("SELECT * FROM;"),
            ValidationResult::Invalid {
                kind: ErrorKind::SyntaxError,
                message: "malformed SELECT".to_string(),
            }
        );
        assert_eq!(kind_of("select*from users;"), Some(ErrorKind::SyntaxError));
        assert_eq!(kind_of("select fromage;"), Some(ErrorKind::SyntaxError));
    }

    #[test]
    fn test_empty_targets_and_source() {
        assert!(validate("SELECT * FROM ;").is_valid());
        assert!(validate("SELECT  FROM users;").is_valid());

        let shape = select_shape("select  from users;").unwrap();
        assert_eq!(shape.targets, "");
        assert_eq!(shape.source, "users");

        let shape = select_shape("select a from  where id = 1;").unwrap();
        assert_eq!(shape.source, "");
        assert_eq!(shape.predicate, Some("id = 1"));

        // One space cannot separate both keywords.
        assert_eq!(kind_of("SELECT FROM users;"), Some(ErrorKind::SyntaxError));
    }

    #[test]
    fn test_segments_stay_on_one_line() {
        assert_eq!(
            validate("SELECT a,\nb FROM users;"),
            ValidationResult::Invalid {
                kind: ErrorKind::SyntaxError,
                message: "malformed SELECT".to_string(),
            }
        );
        assert_eq!(
            kind_of("SELECT * FROM users WHERE a = 1\nAND b = 2;"),
            Some(ErrorKind::SyntaxError)
        );
        assert_eq!(kind_of("SELECT * FROM users\n;"), Some(ErrorKind::SyntaxError));

        // Line breaks between keywords and segments are fine.
        let shape = select_shape("select\na\nfrom users\nwhere id = 1;").unwrap();
        assert_eq!(shape.targets, "a");
        assert_eq!(shape.predicate, Some("id = 1"));
        assert!(validate("SELECT * FROM\n;").is_valid());
    }

    #[test]
    fn test_keyword_inside_identifier() {
        let shape = select_shape("select from_date from wherehouse where id = 1;").unwrap();
        assert_eq!(shape.targets, "from_date");
        assert_eq!(shape.source, "wherehouse");
        assert_eq!(shape.predicate, Some("id = 1"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(validate("sElEcT name FrOm users WhErE id = 2;").is_valid());
    }

    #[test]
    fn test_writes_only_need_terminator() {
        assert!(validate("INSERT garbage;").is_valid());
        assert!(validate("update;").is_valid());
        assert!(validate("DELETE FROM users WHERE user_id = 9;").is_valid());
        assert_eq!(kind_of("DELETE FROM users"), Some(ErrorKind::SyntaxError));
    }

    #[test]
    fn test_other_statements_accepted() {
        assert!(validate("PRAGMA table_info(users);").is_valid());
        assert!(validate(";").is_valid());
    }

    #[test]
    fn test_idempotent() {
        for q in ["SELECT * FROM users;", "SELECT *;", "SELECT * FROM users", "drop table x;"] {
            assert_eq!(validate(q), validate(q));
        }
    }

    #[test]
    fn test_reserved_kinds_never_produced() {
        let samples = [
            "",
            ";",
            "SELECT * FROM users;",
            "SELECT * FROM users",
            "SELECT *;",
            "SELECT * FROM nope WHERE missing_col = 'x';",
            "SELECT * FROM users WHERE;",
            "SELECT a FROM b ORDER BY c GROUP BY d;",
            "INSERT INTO users VALUES (1);",
            "hello world",
        ];
        for q in samples {
            if let Some(kind) = kind_of(q) {
                assert!(
                    matches!(kind, ErrorKind::SyntaxError | ErrorKind::MissingClause),
                    "unexpected kind {kind:?} for {q:?}"
                );
            }
        }
    }
}
