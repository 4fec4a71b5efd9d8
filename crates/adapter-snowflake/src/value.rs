//! Cells of the JSON result format arrive as strings whose encoding depends
//! on the column's `rowType`: epoch offsets for temporal types, hex for
//! binary, plain decimal text for numbers.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use sqlit_core::{Row, Value};

use crate::api::RowType;

const MINUTES_OFFSET_BIAS: i32 = 1440;

pub(crate) fn decode_row(row_type: &[RowType], cells: Vec<Option<String>>) -> Row {
    cells
        .into_iter()
        .enumerate()
        .map(|(index, cell)| match (cell, row_type.get(index)) {
            (None, _) => Value::Null,
            (Some(raw), Some(column)) => decode_cell(column, raw),
            (Some(raw), None) => Value::Text(raw),
        })
        .collect()
}

pub(crate) fn decode_cell(column: &RowType, raw: String) -> Value {
    let decoded = match column.kind.to_ascii_lowercase().as_str() {
        "fixed" if column.scale.unwrap_or(0) == 0 => Some(Value::parse_int(&raw)),
        "real" => Some(Value::parse_float(&raw)),
        "boolean" => Some(Value::parse_bool(&raw)),
        "binary" => hex::decode(&raw).ok().map(Value::Bytes),
        "date" => date(&raw).map(|date| Value::Text(date.to_string())),
        "time" => time(&raw).map(|time| Value::Text(time.to_string())),
        "timestamp_ntz" | "timestamp_ltz" => epoch(&raw)
            .map(|timestamp| Value::Text(timestamp.naive_utc().to_string())),
        "timestamp_tz" => zoned(&raw).map(|timestamp| Value::Text(timestamp.to_rfc3339())),
        _ => None,
    };
    decoded.unwrap_or(Value::Text(raw))
}

fn date(raw: &str) -> Option<NaiveDate> {
    let days = raw.trim().parse::<i64>().ok()?;
    DateTime::UNIX_EPOCH
        .date_naive()
        .checked_add_signed(Duration::try_days(days)?)
}

fn time(raw: &str) -> Option<NaiveTime> {
    let (seconds, nanos) = split_seconds(raw)?;
    NaiveTime::from_num_seconds_from_midnight_opt(u32::try_from(seconds).ok()?, nanos)
}

fn epoch(raw: &str) -> Option<DateTime<chrono::Utc>> {
    let (seconds, nanos) = split_seconds(raw)?;
    DateTime::from_timestamp(seconds, nanos)
}

/// `"<epoch seconds> <offset minutes + 1440>"`.
fn zoned(raw: &str) -> Option<DateTime<FixedOffset>> {
    let (instant, offset) = raw.trim().split_once(' ')?;
    let minutes = offset.parse::<i32>().ok()? - MINUTES_OFFSET_BIAS;
    let offset = FixedOffset::east_opt(minutes * 60)?;
    Some(epoch(instant)?.with_timezone(&offset))
}

/// Splits `"-12.5"` into whole seconds rounded toward negative infinity and
/// a non-negative nanosecond remainder.
fn split_seconds(raw: &str) -> Option<(i64, u32)> {
    let raw = raw.trim();
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    let mut seconds = whole.parse::<i64>().ok()?;
    let digits = fraction.get(..fraction.len().min(9))?;
    let mut nanos = if digits.is_empty() {
        0
    } else {
        format!("{digits:0<9}").parse::<u32>().ok()?
    };
    if whole.starts_with('-') && nanos > 0 {
        seconds -= 1;
        nanos = 1_000_000_000 - nanos;
    }
    Some((seconds, nanos))
}

#[cfg(test)]
mod tests {
    use sqlit_core::Value;

    use super::{decode_cell, decode_row, split_seconds};
    use crate::api::RowType;

    fn column(kind: &str, scale: Option<i64>) -> RowType {
        RowType {
            name: "C".to_string(),
            kind: kind.to_string(),
            scale,
        }
    }

    fn decode(kind: &str, raw: &str) -> Value {
        decode_cell(&column(kind, Some(0)), raw.to_string())
    }

    #[test]
    fn fixed_with_scale_stays_textual() {
        assert_eq!(decode("fixed", "42"), Value::Int(42));
        assert_eq!(
            decode_cell(&column("fixed", Some(2)), "12.50".to_string()),
            Value::Text("12.50".to_string())
        );
        assert_eq!(
            decode("fixed", "99999999999999999999999"),
            Value::Text("99999999999999999999999".to_string())
        );
    }

    #[test]
    fn scalars_decode_by_row_type() {
        assert_eq!(decode("real", "1.5"), Value::Float(1.5));
        assert_eq!(decode("boolean", "true"), Value::Bool(true));
        assert_eq!(decode("binary", "0aff"), Value::Bytes(vec![0x0a, 0xff]));
        assert_eq!(decode("text", "hello"), Value::Text("hello".to_string()));
        assert_eq!(decode("variant", "{\"a\":1}"), Value::Text("{\"a\":1}".to_string()));
    }

    #[test]
    fn temporal_cells_are_rendered_from_epoch_offsets() {
        assert_eq!(decode("date", "18262"), Value::Text("2020-01-01".to_string()));
        assert_eq!(decode("time", "3723.250000000"), Value::Text("01:02:03.250".to_string()));
        assert_eq!(
            decode("timestamp_ntz", "1577836800.000000000"),
            Value::Text("2020-01-01 00:00:00".to_string())
        );
        assert_eq!(
            decode("timestamp_tz", "1577836800.000000000 1500"),
            Value::Text("2020-01-01T01:00:00+01:00".to_string())
        );
    }

    #[test]
    fn negative_epochs_borrow_from_the_whole_second() {
        assert_eq!(split_seconds("-1.25"), Some((-2, 750_000_000)));
        assert_eq!(split_seconds("-1"), Some((-1, 0)));
        assert_eq!(split_seconds("abc"), None);
    }

    #[test]
    fn null_cells_and_missing_metadata() {
        let row_type = vec![column("fixed", Some(0))];
        assert_eq!(
            decode_row(&row_type, vec![None, Some("x".to_string())]),
            vec![Value::Null, Value::Text("x".to_string())]
        );
    }
}
