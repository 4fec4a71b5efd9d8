use aws_sdk_athena::types::Datum;
use sqlit_core::{Row, Value};

/// Athena returns every cell as varchar; `types` are the engine type names
/// from the result metadata. A datum without a value is NULL.
pub(crate) fn decode_row(types: &[String], data: &[Datum]) -> Row {
    data.iter()
        .enumerate()
        .map(|(index, datum)| match datum.var_char_value() {
            None => Value::Null,
            Some(raw) => decode_cell(types.get(index).map_or("varchar", String::as_str), raw),
        })
        .collect()
}

pub(crate) fn decode_cell(data_type: &str, raw: &str) -> Value {
    match data_type.to_ascii_lowercase().as_str() {
        "tinyint" | "smallint" | "integer" | "int" | "bigint" => Value::parse_int(raw),
        "real" | "float" | "double" => Value::parse_float(raw),
        "boolean" => Value::parse_bool(raw),
        // Rendered as space-separated hex pairs.
        "varbinary" => hex::decode(raw.split_whitespace().collect::<String>())
            .map_or_else(|_| Value::Text(raw.to_string()), Value::Bytes),
        _ => Value::Text(raw.to_string()),
    }
}

/// Whether `data` is the header row Athena prepends to SELECT results.
pub(crate) fn is_header_row(columns: &[String], data: &[Datum]) -> bool {
    columns.len() == data.len()
        && columns
            .iter()
            .zip(data)
            .all(|(column, datum)| datum.var_char_value() == Some(column.as_str()))
}

#[cfg(test)]
mod tests {
    use aws_sdk_athena::types::Datum;
    use sqlit_core::Value;

    use super::{decode_cell, decode_row, is_header_row};

    fn datum(value: &str) -> Datum {
        Datum::builder().var_char_value(value).build()
    }

    #[test]
    fn numeric_types_parse() {
        assert_eq!(decode_cell("bigint", "42"), Value::Int(42));
        assert_eq!(decode_cell("double", "1.5"), Value::Float(1.5));
        assert_eq!(decode_cell("boolean", "false"), Value::Bool(false));
        assert_eq!(
            decode_cell("decimal", "12.50"),
            Value::Text("12.50".to_string())
        );
    }

    #[test]
    fn varbinary_is_decoded_from_spaced_hex() {
        assert_eq!(decode_cell("varbinary", "0a ff"), Value::Bytes(vec![0x0a, 0xff]));
        assert_eq!(decode_cell("varbinary", "zz"), Value::Text("zz".to_string()));
    }

    #[test]
    fn missing_values_are_null() {
        let types = vec!["integer".to_string(), "varchar".to_string()];
        let row = decode_row(&types, &[Datum::builder().build(), datum("")]);
        assert_eq!(row, vec![Value::Null, Value::Text(String::new())]);
    }

    #[test]
    fn header_row_matches_column_labels() {
        let columns = vec!["id".to_string(), "name".to_string()];
        assert!(is_header_row(&columns, &[datum("id"), datum("name")]));
        assert!(!is_header_row(&columns, &[datum("1"), datum("Alice")]));
        assert!(!is_header_row(&columns, &[datum("id")]));
    }
}
