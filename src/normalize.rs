//! Translation between the remote table and `Question` records.
//!
//! Reading repairs whatever shape the table is in: missing columns are
//! synthesized, unparseable numbers are replaced, blank names and statuses get
//! their defaults. Writing always emits the six canonical columns in order.

use std::collections::HashSet;

use serde_json::Value;

use crate::models::{Id, Question, Status, ANONYMOUS, COLUMNS};
use crate::table::{cell_text, Table};

/// Largest magnitude a float cell may have and still count as an integer.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0; // 2^53

/// Integer value of a cell, if it holds one.
///
/// Accepts JSON integers, floats without a fractional part, and strings that
/// parse as either once trimmed.
pub fn cell_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    }
}

fn whole(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT).then_some(f as i64)
}

struct Layout {
    id: Option<usize>,
    text: Option<usize>,
    submitter: Option<usize>,
    votes: Option<usize>,
    timestamp: Option<usize>,
    status: Option<usize>,
}

impl Layout {
    fn of(table: &Table) -> Self {
        Self {
            id: table.column_index("id"),
            text: table.column_index("text"),
            submitter: table.column_index("submitter"),
            votes: table.column_index("votes"),
            timestamp: table.column_index("timestamp"),
            status: table.column_index("status"),
        }
    }
}

/// Normalize a fetched table into questions.
///
/// `now` fills the `timestamp` of every row when the column is absent.
pub fn questions_from_table(table: &Table, now: &str) -> Vec<Question> {
    if table.is_empty() {
        return Vec::new();
    }
    let layout = Layout::of(table);
    let text_at = |row: usize, col: Option<usize>| col.map(|c| cell_text(table.cell(row, c)));
    let ids = assign_ids(table, layout.id);

    ids.into_iter()
        .enumerate()
        .map(|(row, id)| {
            let votes = layout
                .votes
                .and_then(|c| cell_int(table.cell(row, c)))
                .filter(|v| *v >= 0)
                .unwrap_or(0);
            let submitter = text_at(row, layout.submitter)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_string());
            let status = text_at(row, layout.status)
                .filter(|s| !s.trim().is_empty())
                .map(Status::from)
                .unwrap_or(Status::Pending);
            Question {
                id,
                text: text_at(row, layout.text).unwrap_or_default(),
                submitter,
                votes,
                timestamp: text_at(row, layout.timestamp).unwrap_or_else(|| now.to_string()),
                status,
            }
        })
        .collect()
}

/// Ids in row order. Without an id column rows are numbered `1..=n`; invalid
/// cells get fresh ids above every valid one, or the lowest free positive ids
/// when the largest valid id is `Id::MAX`.
fn assign_ids(table: &Table, col: Option<usize>) -> Vec<Id> {
    let Some(col) = col else {
        return (1..=table.rows.len() as Id).collect();
    };
    let parsed: Vec<Option<Id>> = (0..table.rows.len())
        .map(|row| cell_int(table.cell(row, col)))
        .collect();
    let taken: HashSet<Id> = parsed.iter().flatten().copied().collect();
    let max = taken.iter().max().copied().unwrap_or(0);
    let mut fresh = max
        .checked_add(1)
        .map(|start| start..=Id::MAX)
        .into_iter()
        .flatten()
        .chain(1..max)
        .filter(|id| !taken.contains(id));
    parsed
        .into_iter()
        .map(|id| id.or_else(|| fresh.next()).unwrap_or_default())
        .collect()
}

/// Project questions onto the canonical six-column table.
///
/// An empty list produces a table with no columns at all.
pub fn table_from_questions(questions: &[Question]) -> Table {
    if questions.is_empty() {
        return Table::default();
    }
    let rows = questions
        .iter()
        .map(|q| {
            vec![
                Value::from(q.id),
                Value::String(q.text.clone()),
                Value::String(q.submitter.clone()),
                Value::from(q.votes),
                Value::String(q.timestamp.clone()),
                Value::String(q.status.as_str().to_string()),
            ]
        })
        .collect();
    Table::new(COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
}

/// Content version of a table: the fingerprint of its normalized form, so
/// that representation differences (`"3"` vs `3`, extra columns) between what
/// was written and what the backend hands back do not count as changes.
pub fn version_of(table: &Table) -> String {
    table_from_questions(&questions_from_table(table, "")).fingerprint()
}
