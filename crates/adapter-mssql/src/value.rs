use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use sqlit_core::{Row, Value};
use tiberius::{ColumnData, Row as TdsRow};

pub(crate) fn decode_row(row: &TdsRow) -> tiberius::Result<Row> {
    row.cells()
        .enumerate()
        .map(|(index, (_column, data))| decode_cell(row, index, data))
        .collect()
}

fn decode_cell(row: &TdsRow, index: usize, data: &ColumnData<'static>) -> tiberius::Result<Value> {
    let value = match data {
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            text(row.try_get::<NaiveDateTime, _>(index)?)
        }
        ColumnData::DateTimeOffset(_) => row
            .try_get::<DateTime<FixedOffset>, _>(index)?
            .map(|timestamp| timestamp.to_rfc3339())
            .into(),
        ColumnData::Date(_) => text(row.try_get::<NaiveDate, _>(index)?),
        ColumnData::Time(_) => text(row.try_get::<NaiveTime, _>(index)?),
        other => decode_scalar(other),
    };
    Ok(value)
}

/// Every non-temporal cell. A `None` payload is SQL NULL for any type;
/// temporal cells are read through chrono by [`decode_cell`].
pub(crate) fn decode_scalar(data: &ColumnData<'_>) -> Value {
    match data {
        ColumnData::Bit(value) => (*value).into(),
        ColumnData::U8(value) => value.map(i64::from).into(),
        ColumnData::I16(value) => value.map(i64::from).into(),
        ColumnData::I32(value) => value.map(i64::from).into(),
        ColumnData::I64(value) => (*value).into(),
        ColumnData::F32(value) => value.map(f64::from).into(),
        ColumnData::F64(value) => (*value).into(),
        ColumnData::Numeric(value) => text(*value),
        ColumnData::String(value) => value.as_deref().into(),
        ColumnData::Guid(value) => text(*value),
        ColumnData::Binary(value) => value.as_deref().map(<[u8]>::to_vec).into(),
        ColumnData::Xml(value) => text(value.as_deref()),
        _ => Value::Null,
    }
}

fn text<T: ToString>(value: Option<T>) -> Value {
    value.map(|value| Value::Text(value.to_string())).into()
}
