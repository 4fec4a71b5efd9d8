use serde::Serialize;

use crate::Value;

pub type Row = Vec<Value>;

/// Returned by `execute_non_query` when the backend cannot report how many
/// rows a statement touched.
pub const ROW_COUNT_UNKNOWN: i64 = -1;

// Schema, session and transaction statements. Backends either report 0 or a
// stale count for these, so `execute_non_query` returns `ROW_COUNT_UNKNOWN`.
const UNCOUNTED_KEYWORDS: &[&str] = &[
    "CREATE", "DROP", "ALTER", "TRUNCATE", "RENAME", "COMMENT", "GRANT", "REVOKE", "SET", "USE",
    "BEGIN", "START", "COMMIT", "END", "ROLLBACK", "SAVEPOINT", "RELEASE", "LOCK", "UNLOCK",
    "PRAGMA", "VACUUM", "ANALYZE", "REINDEX", "ATTACH", "DETACH", "MSCK",
];

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryResult {
    /// Empty when the statement produced no result-set descriptor.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Set when more than `max_rows` rows were available.
    pub truncated: bool,
}

impl QueryResult {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Whether `sql` is a statement whose affected-row count is meaningful.
/// Only the leading keyword is inspected; a `WITH` prefix counts.
#[must_use]
pub fn reports_row_count(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|ch: char| !ch.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    !UNCOUNTED_KEYWORDS
        .iter()
        .any(|uncounted| uncounted.eq_ignore_ascii_case(keyword))
}

/// Number of rows to request from the backend for a given ceiling: one
/// more than the ceiling, so truncation can be detected.
#[must_use]
pub fn fetch_limit(max_rows: Option<usize>) -> Option<usize> {
    max_rows.map(|limit| limit.saturating_add(1))
}

/// Collects rows from a fallible source, reading at most `max_rows + 1`
/// items. Any error aborts the whole collection.
pub fn collect_rows<I, E>(rows: I, max_rows: Option<usize>) -> Result<(Vec<Row>, bool), E>
where
    I: IntoIterator<Item = Result<Row, E>>,
{
    let mut collected = Vec::new();
    let fetch = fetch_limit(max_rows);
    let mut rows = rows.into_iter();

    while fetch.is_none_or(|fetch| collected.len() < fetch) {
        let Some(row) = rows.next() else {
            break;
        };
        collected.push(row?);
    }

    Ok(apply_row_limit(collected, max_rows))
}

/// Cuts an already fetched batch down to `max_rows` and reports whether
/// anything was dropped.
#[must_use]
pub fn apply_row_limit(mut rows: Vec<Row>, max_rows: Option<usize>) -> (Vec<Row>, bool) {
    match max_rows {
        Some(limit) if rows.len() > limit => {
            rows.truncate(limit);
            (rows, true)
        }
        _ => (rows, false),
    }
}

/// Tracks a row ceiling across several fetches (pages, partitions, stream
/// items).
#[derive(Debug)]
pub struct RowCollector {
    rows: Vec<Row>,
    max_rows: Option<usize>,
}

impl RowCollector {
    #[must_use]
    pub fn new(max_rows: Option<usize>) -> Self {
        Self {
            rows: Vec::new(),
            max_rows,
        }
    }

    /// Whether enough rows have been seen to decide truncation.
    #[must_use]
    pub fn is_full(&self) -> bool {
        fetch_limit(self.max_rows).is_some_and(|fetch| self.rows.len() >= fetch)
    }

    /// Adds a row unless the collector is already full. Returns whether more
    /// rows are wanted.
    pub fn push(&mut self, row: Row) -> bool {
        if !self.is_full() {
            self.rows.push(row);
        }
        !self.is_full()
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = Row>) -> bool {
        for row in rows {
            if !self.push(row) {
                return false;
            }
        }
        !self.is_full()
    }

    #[must_use]
    pub fn finish(self, columns: Vec<String>) -> QueryResult {
        let (rows, truncated) = apply_row_limit(self.rows, self.max_rows);
        QueryResult {
            columns,
            rows,
            truncated,
        }
    }
}
