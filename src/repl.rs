//! Interactive shell and the per-request actions shared with the CLI.

use colored::*;

use crate::error::{HomeqlError, HomeqlResult};
use crate::pipeline::{self, Answer, Pipeline};
use crate::render;
use crate::statement::Statement;
use crate::store::{Outcome, RowSet, Store};

/// How row sets are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Table,
    Json,
}

/// A store plus the translator pipeline chosen at startup.
pub struct Session {
    pipeline: Pipeline,
    store: Store,
    format: Format,
}

impl Session {
    pub fn new(pipeline: Pipeline, store: Store, format: Format) -> Self {
        Self {
            pipeline,
            store,
            format,
        }
    }

    /// Validate and execute a statement typed by the user.
    pub async fn run_sql(&self, text: &str) -> HomeqlResult<Option<RowSet>> {
        let statement = pipeline::check(text)?;
        self.execute(&statement).await
    }

    /// Translate a question, then execute it unless `dry_run`.
    pub async fn ask(&self, question: &str, dry_run: bool) -> HomeqlResult<Option<RowSet>> {
        println!(
            "{} {} {}",
            "Question:".dimmed(),
            question.yellow(),
            format!("({})", self.pipeline.origin()).dimmed()
        );
        let answer = self.pipeline.answer(question).await?;
        print_answer(&answer);

        if dry_run {
            return Ok(None);
        }
        self.execute(&answer.statement).await
    }

    async fn execute(&self, statement: &Statement) -> HomeqlResult<Option<RowSet>> {
        match self.store.execute(statement).await? {
            Outcome::Rows(set) => {
                println!("{} Query succeeded", "✓".green());
                match self.format {
                    Format::Table => println!("{}", render::table(&set)),
                    Format::Json => println!("{}", render::json(&set)),
                }
                Ok(Some(set))
            }
            Outcome::Ack { rows_affected } => {
                println!("{} {} row(s) affected", "✓".green(), rows_affected);
                Ok(None)
            }
        }
    }
}

fn print_answer(answer: &Answer) {
    println!("{} {}", "Generated SQL:".green().bold(), answer.candidate.statement);
    if let Some(message) = answer.initial.message() {
        println!("{} {}", "Generated SQL failed validation:".yellow(), message);
        println!("{} {}", "Corrected SQL:".green().bold(), answer.statement);
    }
}

/// Print a request failure with hints where they exist.
pub fn report(err: &HomeqlError) {
    match err {
        HomeqlError::Validation { kind, message, statement } => {
            eprintln!("{} {}", "✗ Validation failed:".red().bold(), message);
            eprintln!("  {} {}", "statement:".dimmed(), statement);
            let hints = kind.hints();
            if !hints.is_empty() {
                eprintln!("{}", "You can try:".dimmed());
                for hint in hints {
                    eprintln!("  - {}", hint);
                }
            }
        }
        HomeqlError::Translation { .. } => {
            eprintln!("{} {}", "✗".red(), "Could not generate SQL. Try rephrasing the question.".red());
        }
        HomeqlError::Execution(message) => {
            eprintln!("{} {}", "✗ Execution failed:".red().bold(), message);
        }
        other => eprintln!("{} {}", "✗".red(), other.to_string().red()),
    }
}

/// Run the interactive shell until `/exit` or end of input.
pub async fn run_repl(session: &Session) {
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    println!("{}", "🏠 homeql — smart-home database shell".cyan().bold());
    println!(
        "{}",
        "Type SQL, or use /help, /nlp, /visualize, /plan, /reset, /exit".dimmed()
    );
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{} {}", "Failed to initialize shell:".red(), e);
            return;
        }
    };

    let history_path = dirs::home_dir()
        .map(|p| p.join(".homeql_history"))
        .unwrap_or_default();
    let _ = rl.load_history(&history_path);

    // Most recent row set, for /visualize.
    let mut last: Option<RowSet> = None;

    loop {
        let prompt = "homeql> ".cyan().bold().to_string();
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                let (command, arg) = match line.split_once(char::is_whitespace) {
                    Some((c, rest)) => (c, rest.trim()),
                    None => (line, ""),
                };

                match command {
                    "/exit" | "/quit" => {
                        println!("{}", "Goodbye! 👋".green());
                        break;
                    }
                    "/help" => show_help(),
                    "/reset" => match session.store.reset().await {
                        Ok(()) => {
                            last = None;
                            println!("{} Database reset", "✓".green());
                        }
                        Err(e) => report(&e),
                    },
                    "/visualize" => visualize(last.as_ref()),
                    "/plan" => show_plan(arg),
                    "/nlp" => {
                        if arg.is_empty() {
                            println!("{}", "Ask a question, e.g.: /nlp 显示所有客厅设备".yellow());
                            continue;
                        }
                        record(&mut last, session.ask(arg, false).await);
                    }
                    _ => record(&mut last, session.run_sql(line).await),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye! 👋".green());
                break;
            }
            Err(err) => {
                eprintln!("{} {:?}", "Error:".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
}

/// Keep the latest row set. Execution failures and writes clear it;
/// requests rejected before execution leave it alone.
fn record(last: &mut Option<RowSet>, result: HomeqlResult<Option<RowSet>>) {
    match result {
        Ok(rows) => *last = rows,
        Err(e) => {
            if matches!(e, HomeqlError::Execution(_)) {
                *last = None;
            }
            report(&e);
        }
    }
}

fn visualize(last: Option<&RowSet>) {
    let Some(set) = last.filter(|s| !s.is_empty()) else {
        println!("{}", "No results to visualize.".yellow());
        return;
    };
    match render::chart(set) {
        Some(chart) => println!("{}", chart.render()),
        None => println!("{}", render::NO_CHART.yellow()),
    }
}

/// Validate, then print the simplified plan.
pub fn show_plan(sql: &str) {
    if sql.is_empty() {
        println!("{}", "Usage: /plan <SQL>".yellow());
        return;
    }
    match pipeline::check(sql) {
        Ok(statement) => {
            println!("{}", "Query plan:".cyan().bold());
            println!("  {}", render::plan_text(statement.as_str()));
        }
        Err(e) => report(&e),
    }
}

/// Show shell help.
pub fn show_help() {
    println!("{}", "homeql commands:".cyan().bold());
    println!("  {}            - Show this help", "/help".yellow());
    println!("  {}            - Exit", "/exit".yellow());
    println!("  {}           - Drop and reseed the database", "/reset".yellow());
    println!("  {}       - Chart the most recent results", "/visualize".yellow());
    println!("  {}      - Show the query plan", "/plan <sql>".yellow());
    println!("  {} - Query in natural language", "/nlp <question>".yellow());
    println!();
    println!("{}", "Any other input is run as SQL, for example:".cyan().bold());
    println!("  SELECT * FROM users;");
    println!("  SELECT * FROM devices WHERE location='客厅';");
    println!(
        "  SELECT device_name, COUNT(*) as usage_count FROM usage_records JOIN devices ON usage_records.device_id = devices.device_id GROUP BY devices.device_id;"
    );
    println!(
        "  SELECT users.user_id, username, COUNT(*) as security_count FROM security_events JOIN users ON security_events.user_id = users.user_id GROUP BY users.user_id;"
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_record_keeps_rows_on_validation_failure() {
        let mut last = Some(RowSet::default());
        record(
            &mut last,
            Err(HomeqlError::validation(ErrorKind::SyntaxError, "x", "y")),
        );
        assert!(last.is_some());

        record(&mut last, Err(HomeqlError::Execution("no such table".into())));
        assert!(last.is_none());

        let rows = RowSet {
            columns: vec!["a".into()],
            rows: vec![],
        };
        record(&mut last, Ok(Some(rows.clone())));
        assert_eq!(last, Some(rows));

        record(&mut last, Ok(None));
        assert!(last.is_none());
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let store = Store::open("sqlite::memory:").await.unwrap();
        let session = Session::new(Pipeline::select(None), store, Format::Json);

        let rows = session.ask("显示所有客厅设备", false).await.unwrap().unwrap();
        assert_eq!(rows.len(), 2);

        assert!(session.ask("安全", true).await.unwrap().is_none());

        let err = session.run_sql("SELECT * FROM users").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::SyntaxError));

        let ack = session.run_sql("DELETE FROM user_feedback;").await.unwrap();
        assert!(ack.is_none());
    }
}
