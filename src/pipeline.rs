//! Question → statement pipeline with a single correction attempt.
//!
//! ```text
//! translate → validate ──valid──────────────────────────→ done
//!                └─invalid→ append ';' → validate ─valid─→ done
//!                                            └─invalid──→ failed
//! ```
//!
//! The validator runs at most twice and the statement is patched at most
//! once per question.

use tracing::{debug, info};

use crate::error::{HomeqlError, HomeqlResult};
use crate::model::ModelTranslator;
use crate::statement::{Origin, Statement, TranslationCandidate};
use crate::translate::{RuleBasedTranslator, Translator};
use crate::validator::{validate, ValidationResult};

/// A statement ready for execution, plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// What the translator produced.
    pub candidate: TranslationCandidate,
    /// Result of validating the candidate as produced.
    pub initial: ValidationResult,
    /// The statement to execute; differs from the candidate if patched.
    pub statement: Statement,
    /// Number of validator runs (1 or 2).
    pub validations: usize,
}

impl Answer {
    pub fn patched(&self) -> bool {
        self.statement != self.candidate.statement
    }
}

/// Chooses a translator once and runs the correction loop for each question.
pub struct Pipeline {
    translator: Box<dyn Translator>,
}

impl Pipeline {
    pub fn new(translator: impl Translator + 'static) -> Self {
        Self {
            translator: Box::new(translator),
        }
    }

    /// Use the model if it was acquired, otherwise the keyword rules.
    pub fn select(model: Option<ModelTranslator>) -> Self {
        match model {
            Some(model) => {
                info!("using model translator");
                Self::new(model)
            }
            None => {
                info!("using rule-based translator");
                Self::new(RuleBasedTranslator::new())
            }
        }
    }

    pub fn origin(&self) -> Origin {
        self.translator.origin()
    }

    /// Translate a question and validate the result, patching once if needed.
    ///
    /// Returns [`HomeqlError::Translation`] if the translator produced
    /// nothing and [`HomeqlError::Validation`] if the statement is still
    /// invalid after the patch.
    pub async fn answer(&self, question: &str) -> HomeqlResult<Answer> {
        let candidate = self
            .translator
            .candidate(question)
            .await
            .ok_or_else(|| HomeqlError::Translation {
                question: question.to_string(),
            })?;
        debug!(origin = %candidate.origin, statement = %candidate.statement, "translated");

        let initial = validate(candidate.statement.as_str());
        if initial.is_valid() {
            return Ok(Answer {
                statement: candidate.statement.clone(),
                candidate,
                initial,
                validations: 1,
            });
        }
        debug!(?initial, "candidate rejected, patching");

        let statement = if candidate.statement.has_terminator() {
            candidate.statement.clone()
        } else {
            candidate.statement.terminated()
        };

        match validate(statement.as_str()) {
            ValidationResult::Valid => {
                debug!(%statement, "patched statement accepted");
                Ok(Answer {
                    candidate,
                    initial,
                    statement,
                    validations: 2,
                })
            }
            ValidationResult::Invalid { kind, message } => {
                debug!(%kind, %message, "patched statement rejected");
                Err(HomeqlError::validation(kind, message, statement.into_string()))
            }
        }
    }
}

/// Validate a statement typed by the user. No correction is attempted.
pub fn check(text: &str) -> HomeqlResult<Statement> {
    let statement = Statement::new(text);
    match validate(statement.as_str()) {
        ValidationResult::Valid => Ok(statement),
        ValidationResult::Invalid { kind, message } => {
            Err(HomeqlError::validation(kind, message, statement.into_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl Translator for Fixed {
        fn origin(&self) -> Origin {
            Origin::Model
        }

        async fn candidate(&self, question: &str) -> Option<TranslationCandidate> {
            self.0
                .map(|sql| TranslationCandidate::new(question, sql, Origin::Model))
        }
    }

    #[tokio::test]
    async fn test_valid_candidate_passes_through() {
        let answer = Pipeline::new(Fixed(Some("SELECT * FROM users;")))
            .answer("q")
            .await
            .unwrap();
        assert_eq!(answer.statement.as_str(), "SELECT * FROM users;");
        assert_eq!(answer.validations, 1);
        assert!(!answer.patched());
    }

    #[tokio::test]
    async fn test_missing_terminator_is_patched() {
        let answer = Pipeline::new(Fixed(Some("SELECT * FROM users")))
            .answer("q")
            .await
            .unwrap();
        assert_eq!(answer.initial.kind(), Some(ErrorKind::SyntaxError));
        assert_eq!(answer.statement.as_str(), "SELECT * FROM users;");
        assert_eq!(answer.candidate.statement.as_str(), "SELECT * FROM users");
        assert_eq!(answer.validations, 2);
        assert!(answer.patched());
    }

    #[tokio::test]
    async fn test_patch_cannot_fix_missing_from() {
        let err = Pipeline::new(Fixed(Some("SELECT name")))
            .answer("q")
            .await
            .unwrap_err();
        match err {
            HomeqlError::Validation { kind, statement, .. } => {
                assert_eq!(kind, ErrorKind::MissingClause);
                assert_eq!(statement, "SELECT name;");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_inner_terminator_not_patched() {
        let err = Pipeline::new(Fixed(Some("SELECT * FROM users; --")))
            .answer("q")
            .await
            .unwrap_err();
        match err {
            HomeqlError::Validation { kind, statement, .. } => {
                assert_eq!(kind, ErrorKind::SyntaxError);
                assert_eq!(statement, "SELECT * FROM users; --");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_candidate_is_translation_failure() {
        let err = Pipeline::new(Fixed(None)).answer("anything").await.unwrap_err();
        assert!(matches!(err, HomeqlError::Translation { question } if question == "anything"));
    }

    #[tokio::test]
    async fn test_select_falls_back_to_rules() {
        let pipeline = Pipeline::select(None);
        assert_eq!(pipeline.origin(), Origin::RuleBased);
        let answer = pipeline.answer("").await.unwrap();
        assert_eq!(answer.statement.as_str(), "SELECT * FROM users;");
    }

    #[test]
    fn test_check() {
        assert!(check(" SELECT * FROM devices; ").is_ok());
        assert_eq!(
            check("SELECT * WHERE x=1;").unwrap_err().kind(),
            Some(ErrorKind::MissingClause)
        );
    }
}
