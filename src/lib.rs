//! # homeql — ask your smart-home database
//!
//! Type SQL directly or ask a question in plain language. Questions go
//! through a translator (an external text-generation model when one is
//! reachable, a keyword matcher otherwise), then through a structural
//! validator with one automatic correction attempt.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use homeql::prelude::*;
//!
//! let pipeline = Pipeline::select(None);
//! let answer = pipeline.answer("显示所有客厅设备").await?;
//! assert_eq!(answer.statement.as_str(), "SELECT * FROM devices WHERE location='客厅';");
//!
//! let store = Store::open("sqlite::memory:").await?;
//! let outcome = store.execute(&answer.statement).await?;
//! ```
//!
//! ## Validation
//!
//! | Statement                 | Rule                                  |
//! |---------------------------|---------------------------------------|
//! | any                       | must end with `;`                     |
//! | `select`                  | needs `from`, then the accepted shape |
//! | `insert`/`update`/`delete`| terminator only                       |

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod repl;
pub mod schema;
pub mod statement;
pub mod store;
pub mod translate;
pub mod validator;

pub mod prelude {
    pub use crate::config::{Config, ModelConfig};
    pub use crate::error::*;
    pub use crate::model::{Generator, HttpGenerator, ModelTranslator};
    pub use crate::pipeline::{check, Answer, Pipeline};
    pub use crate::statement::{Origin, Statement, TranslationCandidate};
    pub use crate::store::{Outcome, RowSet, Store};
    pub use crate::translate::{RuleBasedTranslator, Translator};
    pub use crate::validator::{validate, ValidationResult};
}

/// Validate a statement.
///
/// # Example
///
/// ```
/// use homeql::validate;
///
/// assert!(validate("SELECT * FROM users;").is_valid());
/// assert!(!validate("SELECT * FROM users").is_valid());
/// ```
pub fn validate(text: &str) -> validator::ValidationResult {
    validator::validate(text)
}
