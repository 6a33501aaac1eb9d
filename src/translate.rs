//! Natural-language to SQL translation.
//!
//! [`Translator`] is the capability both backends implement. The
//! rule-based backend is a fixed keyword table and never fails.

use async_trait::async_trait;

use crate::statement::{Origin, Statement, TranslationCandidate};

/// Turns a question into a candidate statement.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Which backend this is.
    fn origin(&self) -> Origin;

    /// Produce a candidate, or `None` if this call could not.
    async fn candidate(&self, question: &str) -> Option<TranslationCandidate>;
}

/// Statement returned when nothing matches.
pub const DEFAULT_SQL: &str = "SELECT * FROM users;";

const ALL_USERS: &str = "SELECT * FROM users;";
const ALL_DEVICES: &str = "SELECT * FROM devices;";
const USAGE_HISTORY: &str = "SELECT * FROM usage_records;";
const USAGE_PER_DEVICE: &str = "SELECT devices.device_name, COUNT(*) as usage_count FROM usage_records JOIN devices ON usage_records.device_id = devices.device_id GROUP BY devices.device_id;";
const SECURITY_EVENTS: &str = "SELECT * FROM security_events;";

/// A sub-keyword mapping inside a category.
struct Rule {
    keywords: &'static [&'static str],
    sql: &'static str,
}

/// A topic recognised by any of its keywords, tried in table order.
struct Category {
    keywords: &'static [&'static str],
    rules: &'static [Rule],
    fallback: &'static str,
}

// Order matters: categories and rules are tested top to bottom and the first
// hit wins. Keywords are lower-case; questions are lower-cased first.
const CATEGORIES: &[Category] = &[
    Category {
        keywords: &["用户", "username"],
        rules: &[
            Rule { keywords: &["所有"], sql: ALL_USERS },
            Rule { keywords: &["alice"], sql: "SELECT * FROM users WHERE username='Alice';" },
            Rule { keywords: &["bob"], sql: "SELECT * FROM users WHERE username='Bob';" },
            Rule { keywords: &["charlie"], sql: "SELECT * FROM users WHERE username='Charlie';" },
        ],
        fallback: ALL_USERS,
    },
    Category {
        keywords: &["设备", "device"],
        rules: &[
            Rule { keywords: &["客厅"], sql: "SELECT * FROM devices WHERE location='客厅';" },
            Rule { keywords: &["卧室"], sql: "SELECT * FROM devices WHERE location='主卧';" },
            Rule { keywords: &["厨房"], sql: "SELECT * FROM devices WHERE location='厨房';" },
            Rule { keywords: &["浴室"], sql: "SELECT * FROM devices WHERE location='浴室';" },
            Rule { keywords: &["所有"], sql: ALL_DEVICES },
        ],
        fallback: ALL_DEVICES,
    },
    Category {
        keywords: &["使用", "usage"],
        rules: &[Rule { keywords: &["记录", "历史"], sql: USAGE_HISTORY }],
        fallback: USAGE_PER_DEVICE,
    },
    Category {
        keywords: &["安全", "security"],
        rules: &[],
        fallback: SECURITY_EVENTS,
    },
];

fn mentions(question: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| question.contains(kw))
}

/// Keyword matcher over the fixed schema. Deterministic and total.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedTranslator;

impl RuleBasedTranslator {
    pub fn new() -> Self {
        Self
    }

    /// Map a question to a statement. Always returns something.
    pub fn translate(&self, question: &str) -> Statement {
        let question = question.to_lowercase();

        let sql = CATEGORIES
            .iter()
            .find(|c| mentions(&question, c.keywords))
            .map(|c| {
                c.rules
                    .iter()
                    .find(|r| mentions(&question, r.keywords))
                    .map_or(c.fallback, |r| r.sql)
            })
            .unwrap_or(DEFAULT_SQL);

        Statement::new(sql)
    }
}

#[async_trait]
impl Translator for RuleBasedTranslator {
    fn origin(&self) -> Origin {
        Origin::RuleBased
    }

    async fn candidate(&self, question: &str) -> Option<TranslationCandidate> {
        let statement = self.translate(question);
        Some(TranslationCandidate::new(question, statement, Origin::RuleBased))
    }
}
