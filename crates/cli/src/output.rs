use std::fmt::Write as _;

use serde::Serialize;
use sqlit_core::{
    AdapterDescriptor, ColumnInfo, IndexInfo, QueryResult, ROW_COUNT_UNKNOWN, SequenceInfo,
    TableInfo, TriggerInfo,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AdapterSummary {
    pub db_type: &'static str,
    pub display_name: &'static str,
    pub badge: &'static str,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_command: Option<String>,
}

impl AdapterSummary {
    pub(crate) fn new(descriptor: &AdapterDescriptor, available: bool) -> Self {
        Self {
            db_type: descriptor.db_type,
            display_name: descriptor.display_name,
            badge: descriptor.badge_label,
            available,
            install_command: (!available).then(|| descriptor.driver.install_command()),
        }
    }
}

/// Everything a command can print.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub(crate) enum Output {
    Adapters(Vec<AdapterSummary>),
    Names(Vec<String>),
    Tables(Vec<TableInfo>),
    Columns(Vec<ColumnInfo>),
    Indexes(Vec<IndexInfo>),
    Triggers(Vec<TriggerInfo>),
    Sequences(Vec<SequenceInfo>),
    Rows(QueryResult),
    Affected { affected: Option<i64> },
}

impl Output {
    pub(crate) fn affected(count: i64) -> Self {
        Self::Affected {
            affected: (count != ROW_COUNT_UNKNOWN).then_some(count),
        }
    }
}

pub(crate) fn render(output: &Output, format: Format) -> Result<String, serde_json::Error> {
    match format {
        Format::Json => serde_json::to_string_pretty(output).map(|json| json + "\n"),
        Format::Text => Ok(render_text(output)),
    }
}

fn render_text(output: &Output) -> String {
    let mut lines = match output {
        Output::Adapters(adapters) => adapters
            .iter()
            .map(|adapter| {
                let status = match &adapter.install_command {
                    None => "available".to_string(),
                    Some(command) => format!("missing ({command})"),
                };
                format!("{}\t{}\t{status}", adapter.db_type, adapter.display_name)
            })
            .collect::<Vec<_>>(),
        Output::Names(names) => names.clone(),
        Output::Tables(tables) => tables
            .iter()
            .map(|table| format!("{}\t{}", table.schema, table.name))
            .collect(),
        Output::Columns(columns) => columns
            .iter()
            .map(|column| {
                let key = if column.is_primary_key { "\tPK" } else { "" };
                format!("{}\t{}{key}", column.name, column.data_type)
            })
            .collect(),
        Output::Indexes(indexes) => indexes
            .iter()
            .map(|index| {
                let unique = if index.is_unique { "\tunique" } else { "" };
                format!("{}\t{}{unique}", index.name, index.table_name)
            })
            .collect(),
        Output::Triggers(triggers) => triggers
            .iter()
            .map(|trigger| format!("{}\t{}", trigger.name, trigger.table_name))
            .collect(),
        Output::Sequences(sequences) => sequences
            .iter()
            .map(|sequence| sequence.name.clone())
            .collect(),
        Output::Rows(result) => return render_rows(result),
        Output::Affected { affected } => vec![match affected {
            Some(count) => format!("{count} row(s) affected"),
            None => "statement executed".to_string(),
        }],
    };
    lines.push(String::new());
    lines.join("\n")
}

fn render_rows(result: &QueryResult) -> String {
    let mut text = String::new();
    if !result.columns.is_empty() {
        text.push_str(&result.columns.join("\t"));
        text.push('\n');
    }
    for row in &result.rows {
        let cells = row.iter().map(ToString::to_string).collect::<Vec<_>>();
        text.push_str(&cells.join("\t"));
        text.push('\n');
    }
    let count = result.rows.len();
    let _ = if result.truncated {
        writeln!(text, "({count} rows, truncated)")
    } else {
        writeln!(text, "({count} rows)")
    };
    text
}

#[cfg(test)]
mod tests {
    use sqlit_core::{ColumnInfo, QueryResult, Value, descriptor::builtin};

    use super::{AdapterSummary, Format, Output, render};

    #[test]
    fn rows_render_as_tab_separated_text_with_footer() {
        let output = Output::Rows(QueryResult {
            columns: vec!["id".to_string(), "label".to_string()],
            rows: vec![
                vec![Value::Int(1), Value::Text("a".to_string())],
                vec![Value::Int(2), Value::Null],
            ],
            truncated: true,
        });

        assert_eq!(
            render(&output, Format::Text).expect("render"),
            "id\tlabel\n1\ta\n2\tNULL\n(2 rows, truncated)\n"
        );
    }

    #[test]
    fn rows_render_as_json_values() {
        let output = Output::Rows(QueryResult {
            columns: vec!["n".to_string()],
            rows: vec![vec![Value::Int(1)], vec![Value::Null]],
            truncated: false,
        });
        let json: serde_json::Value =
            serde_json::from_str(&render(&output, Format::Json).expect("render")).expect("json");

        assert_eq!(
            json,
            serde_json::json!({ "columns": ["n"], "rows": [[1], [null]], "truncated": false })
        );
    }

    #[test]
    fn primary_key_columns_are_flagged() {
        let output = Output::Columns(vec![
            ColumnInfo {
                name: "id".to_string(),
                data_type: "INTEGER".to_string(),
                is_primary_key: true,
            },
            ColumnInfo {
                name: "label".to_string(),
                data_type: "TEXT".to_string(),
                is_primary_key: false,
            },
        ]);
        assert_eq!(
            render(&output, Format::Text).expect("render"),
            "id\tINTEGER\tPK\nlabel\tTEXT\n"
        );
    }

    #[test]
    fn unknown_row_counts_are_not_reported_as_numbers() {
        assert_eq!(
            render(&Output::affected(-1), Format::Json).expect("render"),
            "{\n  \"affected\": null\n}\n"
        );
        assert_eq!(
            render(&Output::affected(3), Format::Text).expect("render"),
            "3 row(s) affected\n"
        );
    }

    #[test]
    fn missing_adapters_show_install_command() {
        let summary = AdapterSummary::new(&builtin::ATHENA, false);
        assert_eq!(
            summary.install_command.as_deref(),
            Some("cargo install sqlit-cli --features athena")
        );
        let text = render(&Output::Adapters(vec![summary]), Format::Text).expect("render");
        assert!(text.starts_with("athena\tAWS Athena\tmissing (cargo install"));
    }
}
