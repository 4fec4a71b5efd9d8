use std::{error::Error as StdError, fmt::Write as _};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use fallible_iterator::FallibleIterator;
use postgres::{
    Row as PgRow,
    types::{FromSql, Kind, Type},
};
use postgres_protocol::types::{ArrayDimension, array_from_sql};
use sqlit_core::{Row, Value};

type DecodeError = Box<dyn StdError + Sync + Send>;

const NUMERIC_POSITIVE: u16 = 0x0000;
const NUMERIC_NEGATIVE: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_POSITIVE_INFINITY: u16 = 0xD000;
const NUMERIC_NEGATIVE_INFINITY: u16 = 0xF000;

const MICROS_PER_SECOND: u64 = 1_000_000;
const MICROS_PER_MINUTE: u64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: u64 = 60 * MICROS_PER_MINUTE;

pub(crate) fn decode_row(row: &PgRow) -> Result<Row, postgres::Error> {
    (0..row.len())
        .map(|index| {
            Ok(row
                .try_get::<_, Option<Cell>>(index)?
                .map_or(Value::Null, |cell| cell.0))
        })
        .collect()
}

/// A cell of any column type, decoded from its binary wire form.
struct Cell(Value);

impl<'a> FromSql<'a> for Cell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, DecodeError> {
        decode_value(ty, raw).map(Self)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Maps one non-NULL value. Arrays, intervals and enum labels become text;
/// types without a mapping keep their binary wire bytes.
fn decode_value(ty: &Type, raw: &[u8]) -> Result<Value, DecodeError> {
    let builtin_name = if ty.schema() == "pg_catalog" {
        ty.name()
    } else {
        ""
    };

    let value: Value = match builtin_name {
        "bool" => bool::from_sql(ty, raw)?.into(),
        "char" => i64::from(i8::from_sql(ty, raw)?).into(),
        "int2" => i64::from(i16::from_sql(ty, raw)?).into(),
        "int4" => i64::from(i32::from_sql(ty, raw)?).into(),
        "int8" => i64::from_sql(ty, raw)?.into(),
        "oid" => i64::from(u32::from_sql(ty, raw)?).into(),
        "float4" => f64::from(f32::from_sql(ty, raw)?).into(),
        "float8" => f64::from_sql(ty, raw)?.into(),
        "numeric" => decode_numeric(raw)?.into(),
        "text" | "varchar" | "bpchar" | "name" | "unknown" => String::from_sql(ty, raw)?.into(),
        "bytea" => Vec::<u8>::from_sql(ty, raw)?.into(),
        "json" | "jsonb" => text(serde_json::Value::from_sql(ty, raw)?),
        "uuid" => text(uuid::Uuid::from_sql(ty, raw)?),
        "date" => text(NaiveDate::from_sql(ty, raw)?),
        "time" => text(NaiveTime::from_sql(ty, raw)?),
        "timestamp" => text(NaiveDateTime::from_sql(ty, raw)?),
        "timestamptz" => DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339().into(),
        "interval" => decode_interval(raw)?.into(),
        _ => match ty.kind() {
            Kind::Array(member) => decode_array(member, raw)?.into(),
            Kind::Enum(_) => std::str::from_utf8(raw)?.into(),
            Kind::Domain(base) => decode_value(base, raw)?,
            _ => raw.to_vec().into(),
        },
    };
    Ok(value)
}

fn text<T: ToString>(value: T) -> Value {
    Value::Text(value.to_string())
}

/// Renders an array the way PostgreSQL prints it, e.g. `{{1,2},{3,NULL}}`,
/// with a `[lower:upper]=` prefix when a dimension does not start at 1.
pub(crate) fn decode_array(member: &Type, raw: &[u8]) -> Result<String, DecodeError> {
    let array = array_from_sql(raw)?;
    let dimensions: Vec<ArrayDimension> = array.dimensions().collect()?;
    let values: Vec<Option<&[u8]>> = array.values().collect()?;

    let lengths = dimensions
        .iter()
        .map(|dimension| usize::try_from(dimension.len))
        .collect::<Result<Vec<_>, _>>()?;
    if !lengths.is_empty() && lengths.iter().product::<usize>() != values.len() {
        return Err(format!(
            "array dimensions {lengths:?} do not match {} elements",
            values.len()
        )
        .into());
    }

    let mut elements = values
        .into_iter()
        .map(|value| match value {
            None => Ok("NULL".to_string()),
            Some(raw) => decode_value(member, raw).map(|value| array_element(&value)),
        })
        .collect::<Result<Vec<_>, DecodeError>>()?
        .into_iter();

    let mut rendered = String::new();
    if dimensions.iter().any(|dimension| dimension.lower_bound != 1) {
        for dimension in &dimensions {
            let upper = i64::from(dimension.lower_bound) + i64::from(dimension.len) - 1;
            write!(rendered, "[{}:{upper}]", dimension.lower_bound)?;
        }
        rendered.push('=');
    }
    if lengths.is_empty() {
        rendered.push_str("{}");
    } else {
        write_dimension(&lengths, &mut elements, &mut rendered);
    }
    Ok(rendered)
}

fn write_dimension(lengths: &[usize], elements: &mut impl Iterator<Item = String>, out: &mut String) {
    let Some((&length, inner)) = lengths.split_first() else {
        return;
    };
    out.push('{');
    for position in 0..length {
        if position > 0 {
            out.push(',');
        }
        if inner.is_empty() {
            out.extend(elements.next());
        } else {
            write_dimension(inner, elements, out);
        }
    }
    out.push('}');
}

fn array_element(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "t".to_string(),
        Value::Bool(false) => "f".to_string(),
        Value::Int(_) | Value::Float(_) => value.to_string(),
        Value::Text(text) => quote_element(text),
        Value::Bytes(bytes) => {
            let hex = bytes.iter().map(|byte| format!("{byte:02x}")).collect::<String>();
            quote_element(&format!("\\x{hex}"))
        }
    }
}

fn quote_element(text: &str) -> String {
    let needs_quotes = text.is_empty()
        || text.eq_ignore_ascii_case("NULL")
        || text
            .chars()
            .any(|ch| matches!(ch, '{' | '}' | ',' | '"' | '\\') || ch.is_ascii_whitespace());
    if !needs_quotes {
        return text.to_string();
    }

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        if matches!(ch, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Decodes INTERVAL (microseconds: i64, days: i32, months: i32) into the
/// default `postgres` output style, e.g. `1 year 2 mons -3 days +04:05:06.5`.
pub(crate) fn decode_interval(raw: &[u8]) -> Result<String, DecodeError> {
    if raw.len() != 16 {
        return Err(format!("INTERVAL value must be 16 bytes, got {}", raw.len()).into());
    }
    let micros = i64::from_be_bytes(raw[0..8].try_into()?);
    let days = i32::from_be_bytes(raw[8..12].try_into()?);
    let months = i32::from_be_bytes(raw[12..16].try_into()?);

    let mut rendered = String::new();
    let mut after_negative = false;
    for (value, unit) in [(months / 12, "year"), (months % 12, "mon"), (days, "day")] {
        if value == 0 {
            continue;
        }
        let separator = if rendered.is_empty() { "" } else { " " };
        let plus = if after_negative && value > 0 { "+" } else { "" };
        let plural = if value == 1 { "" } else { "s" };
        write!(rendered, "{separator}{plus}{value} {unit}{plural}")?;
        after_negative = value < 0;
    }

    if rendered.is_empty() || micros != 0 {
        let separator = if rendered.is_empty() { "" } else { " " };
        let sign = if micros < 0 {
            "-"
        } else if after_negative {
            "+"
        } else {
            ""
        };
        let magnitude = micros.unsigned_abs();
        write!(
            rendered,
            "{separator}{sign}{:02}:{:02}:{:02}",
            magnitude / MICROS_PER_HOUR,
            magnitude % MICROS_PER_HOUR / MICROS_PER_MINUTE,
            magnitude % MICROS_PER_MINUTE / MICROS_PER_SECOND,
        )?;
        let fraction = magnitude % MICROS_PER_SECOND;
        if fraction > 0 {
            let digits = format!("{fraction:06}");
            rendered.push('.');
            rendered.push_str(digits.trim_end_matches('0'));
        }
    }

    Ok(rendered)
}

/// Decodes the binary NUMERIC layout: ndigits, weight, sign, dscale (all
/// 16-bit big-endian) followed by `ndigits` base-10000 digits.
pub(crate) fn decode_numeric(raw: &[u8]) -> Result<String, DecodeError> {
    let word = |offset: usize| -> Result<u16, DecodeError> {
        raw.get(offset..offset + 2)
            .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
            .ok_or_else(|| "truncated NUMERIC value".into())
    };

    let ndigits = usize::from(word(0)?);
    let weight = i64::from(word(2)? as i16);
    let sign = word(4)?;
    let dscale = usize::from(word(6)?);
    let digits = (0..ndigits)
        .map(|index| word(8 + index * 2))
        .collect::<Result<Vec<_>, _>>()?;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_POSITIVE_INFINITY => return Ok("Infinity".to_string()),
        NUMERIC_NEGATIVE_INFINITY => return Ok("-Infinity".to_string()),
        NUMERIC_POSITIVE | NUMERIC_NEGATIVE => {}
        other => return Err(format!("invalid NUMERIC sign 0x{other:04x}").into()),
    }

    let digit_at = |position: i64| -> u16 {
        usize::try_from(position)
            .ok()
            .and_then(|position| digits.get(position).copied())
            .unwrap_or(0)
    };

    let mut rendered = String::new();
    if sign == NUMERIC_NEGATIVE {
        rendered.push('-');
    }

    if weight < 0 {
        rendered.push('0');
    } else {
        for position in 0..=weight {
            let digit = digit_at(position);
            if position == 0 {
                write!(rendered, "{digit}")?;
            } else {
                write!(rendered, "{digit:04}")?;
            }
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut position = weight + 1;
        while fraction.len() < dscale {
            write!(fraction, "{:04}", digit_at(position))?;
            position += 1;
        }
        fraction.truncate(dscale);
        rendered.push('.');
        rendered.push_str(&fraction);
    }

    Ok(rendered)
}
