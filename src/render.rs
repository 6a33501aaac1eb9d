//! Terminal rendering of row sets, charts and query plans.

use colored::*;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use crate::store::RowSet;

/// Largest bar, in cells.
const BAR_WIDTH: usize = 40;

/// Render a value for display.
pub fn cell_text(val: &Value) -> String {
    match val {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}

/// Aligned text table with a row-count footer.
pub fn table(set: &RowSet) -> String {
    if set.is_empty() {
        return "(no results)".dimmed().to_string();
    }

    let mut widths: Vec<usize> = set.columns.iter().map(|c| c.width()).collect();
    for row in &set.rows {
        for (w, val) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell_text(val).width());
        }
    }

    let mut out = String::new();

    let header: Vec<String> = set
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(c, *w))
        .collect();
    out.push_str(&header.join(" │ ").white().bold().to_string());
    out.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    out.push_str(&sep.join("─┼─").dimmed().to_string());
    out.push('\n');

    for row in &set.rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(val, w)| pad(&cell_text(val), *w))
            .collect();
        out.push_str(&cells.join(" │ "));
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&format!("{} row(s) returned", set.len().to_string().cyan()));
    out
}

/// Pretty JSON array of row objects.
pub fn json(set: &RowSet) -> String {
    serde_json::to_string_pretty(&set.to_json()).unwrap_or_default()
}

/// Left-align `text` in `width` terminal columns. CJK glyphs take two.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// A chart chosen from the columns of a row set.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    /// Usage count per device.
    DeviceUsage(Vec<(String, f64)>),
    /// Share of security events per user.
    SecurityShare(Vec<(String, f64)>),
}

/// Pick a chart for the row set, if its columns match a known shape.
pub fn chart(set: &RowSet) -> Option<Chart> {
    if set.is_empty() {
        return None;
    }

    if set.has_column("device_name") && set.has_column("usage_count") {
        return Some(Chart::DeviceUsage(series(set, "device_name", Some("usage_count"))));
    }

    if set.has_column("user_id") && set.has_column("username") {
        let counts = set.has_column("security_count").then_some("security_count");
        return Some(Chart::SecurityShare(series(set, "username", counts)));
    }

    None
}

/// Label/value pairs; rows without a numeric value count as 1.
fn series(set: &RowSet, label: &str, value: Option<&str>) -> Vec<(String, f64)> {
    (0..set.len())
        .map(|i| {
            let name = set.get(i, label).map(cell_text).unwrap_or_default();
            let amount = value
                .and_then(|col| set.get(i, col))
                .and_then(Value::as_f64)
                .unwrap_or(1.0);
            (name, amount)
        })
        .collect()
}

impl Chart {
    pub fn title(&self) -> &'static str {
        match self {
            Chart::DeviceUsage(_) => "Device usage frequency",
            Chart::SecurityShare(_) => "Security event distribution",
        }
    }

    /// Horizontal bars; the share chart also prints percentages.
    pub fn render(&self) -> String {
        let (data, percent) = match self {
            Chart::DeviceUsage(data) => (data, false),
            Chart::SecurityShare(data) => (data, true),
        };

        let label_width = data.iter().map(|(l, _)| l.width()).max().unwrap_or(0);
        let max = data.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
        let total: f64 = data.iter().map(|(_, v)| *v).sum();

        let mut out = format!("{}\n", self.title().cyan().bold());
        for (label, value) in data {
            let len = if max > 0.0 {
                ((value / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            let figure = if percent && total > 0.0 {
                format!("{:.1}%", value / total * 100.0)
            } else {
                value.to_string()
            };
            out.push_str(&format!(
                "{} {} {}\n",
                pad(label, label_width),
                "█".repeat(len).green(),
                figure.yellow()
            ));
        }
        out
    }
}

/// Message shown when no chart fits.
pub const NO_CHART: &str =
    "Current results cannot be charted. Supported: device usage frequency (device_name, usage_count), security event distribution (user_id, username)";

/// Simplified execution plan: fixed stages, then one step per clause found.
pub fn plan(sql: &str) -> Vec<String> {
    let lower = sql.to_lowercase();
    let mut stages: Vec<String> = ["parser", "optimizer", "executor"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let steps = [
        ("where", "filter"),
        ("group by", "group"),
        ("order by", "sort"),
        ("join", "join tables"),
    ];
    let ops = steps.iter().filter(|(kw, _)| lower.contains(kw)).map(|(_, op)| op);
    for (i, op) in ops.enumerate() {
        stages.push(format!("step {}: {}", i + 1, op));
    }
    stages
}

/// Render a plan as an arrow chain.
pub fn plan_text(sql: &str) -> String {
    plan(sql).join(" → ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn set(columns: &[&str], rows: Vec<Vec<Value>>) -> RowSet {
        RowSet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_table_layout() {
        colored::control::set_override(false);
        let s = set(&["id", "name"], vec![vec![json!(1), json!("Alice")], vec![json!(22), Value::Null]]);
        let text = table(&s);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id │ name ");
        assert_eq!(lines[1], "───┼──────");
        assert_eq!(lines[2], "1  │ Alice");
        assert_eq!(lines[3], "22 │ NULL ");
        assert_eq!(lines[5], "2 row(s) returned");
    }

    #[test]
    fn test_table_aligns_wide_glyphs() {
        colored::control::set_override(false);
        let s = set(
            &["device_name", "location"],
            vec![vec![json!("客厅灯"), json!("客厅")], vec![json!("lamp"), json!("x")]],
        );
        let text = table(&s);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "device_name │ location");
        assert_eq!(lines[2], "客厅灯      │ 客厅    ");
        assert_eq!(lines[3], "lamp        │ x       ");
        assert_eq!(lines[2].width(), lines[0].width());
    }

    #[test]
    fn test_device_usage_chart() {
        let s = set(
            &["device_name", "usage_count"],
            vec![vec![json!("lamp"), json!(2)], vec![json!("tv"), json!(1)]],
        );
        assert_eq!(
            chart(&s),
            Some(Chart::DeviceUsage(vec![("lamp".into(), 2.0), ("tv".into(), 1.0)]))
        );
    }

    #[test]
    fn test_security_share_defaults_to_one() {
        let s = set(
            &["user_id", "username"],
            vec![vec![json!(1), json!("Alice")], vec![json!(3), json!("Charlie")]],
        );
        let c = chart(&s).unwrap();
        assert_eq!(c, Chart::SecurityShare(vec![("Alice".into(), 1.0), ("Charlie".into(), 1.0)]));
        colored::control::set_override(false);
        assert!(c.render().contains("50.0%"));
    }

    #[test]
    fn test_no_chart() {
        assert_eq!(chart(&set(&["device_id"], vec![vec![json!(1)]])), None);
        assert_eq!(chart(&RowSet::default()), None);
    }

    #[test]
    fn test_plan_stages() {
        assert_eq!(plan("SELECT * FROM users;"), vec!["parser", "optimizer", "executor"]);
        assert_eq!(
            plan("SELECT a FROM x JOIN y ON x.id = y.id GROUP BY a ORDER BY a;"),
            vec![
                "parser",
                "optimizer",
                "executor",
                "step 1: group",
                "step 2: sort",
                "step 3: join tables",
            ]
        );
    }
}
