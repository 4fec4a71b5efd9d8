use mysql::{Row as MysqlRow, Value as MysqlValue, consts::ColumnType};
use sqlit_core::{Row, Value};

/// Collation id MySQL reports for binary strings and BLOB columns.
const BINARY_CHARSET: u16 = 63;

pub(crate) fn decode_row(row: &MysqlRow) -> Row {
    row.columns_ref()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            row.as_ref(index).map_or(Value::Null, |raw| {
                decode_cell(raw, column.column_type(), column.character_set())
            })
        })
        .collect()
}

/// The text protocol delivers every cell as bytes; the column type decides
/// how they are read. Binary-protocol variants map directly.
pub(crate) fn decode_cell(raw: &MysqlValue, column_type: ColumnType, charset: u16) -> Value {
    match raw {
        MysqlValue::NULL => Value::Null,
        MysqlValue::Bytes(bytes) => decode_text_cell(bytes, column_type, charset),
        MysqlValue::Int(value) => Value::Int(*value),
        MysqlValue::UInt(value) => {
            i64::try_from(*value).map_or_else(|_| Value::Text(value.to_string()), Value::Int)
        }
        MysqlValue::Float(value) => Value::Float(f64::from(*value)),
        MysqlValue::Double(value) => Value::Float(*value),
        MysqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let date = format!("{year:04}-{month:02}-{day:02}");
            if (*hour, *minute, *second, *micros) == (0, 0, 0, 0) {
                Value::Text(date)
            } else {
                Value::Text(format!(
                    "{date} {}",
                    clock(*hour, *minute, *second, *micros)
                ))
            }
        }
        MysqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u32::from(*hours) + days * 24;
            Value::Text(format!(
                "{sign}{}",
                clock_hours(hours, *minutes, *seconds, *micros)
            ))
        }
    }
}

fn decode_text_cell(bytes: &[u8], column_type: ColumnType, charset: u16) -> Value {
    use ColumnType::*;

    match column_type {
        MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_LONG | MYSQL_TYPE_LONGLONG
        | MYSQL_TYPE_INT24 | MYSQL_TYPE_YEAR => Value::parse_int(&String::from_utf8_lossy(bytes)),
        MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE => {
            Value::parse_float(&String::from_utf8_lossy(bytes))
        }
        MYSQL_TYPE_BIT | MYSQL_TYPE_GEOMETRY => Value::Bytes(bytes.to_vec()),
        MYSQL_TYPE_TINY_BLOB | MYSQL_TYPE_MEDIUM_BLOB | MYSQL_TYPE_LONG_BLOB | MYSQL_TYPE_BLOB
        | MYSQL_TYPE_VAR_STRING | MYSQL_TYPE_STRING | MYSQL_TYPE_VARCHAR
            if charset == BINARY_CHARSET =>
        {
            Value::Bytes(bytes.to_vec())
        }
        _ => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn clock(hour: u8, minute: u8, second: u8, micros: u32) -> String {
    clock_hours(u32::from(hour), minute, second, micros)
}

fn clock_hours(hours: u32, minute: u8, second: u8, micros: u32) -> String {
    if micros == 0 {
        format!("{hours:02}:{minute:02}:{second:02}")
    } else {
        format!("{hours:02}:{minute:02}:{second:02}.{micros:06}")
    }
}
