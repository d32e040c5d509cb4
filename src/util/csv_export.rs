use serde_json::{Map, Value};

/// Renders JSON rows as CSV.
///
/// Nested objects are flattened into dotted column names
/// (`profile.location.city`). Columns appear in first-seen order across all
/// rows so sparse documents still line up.
pub fn to_csv(rows: &[Value]) -> Result<String, csv::Error> {
    let flattened: Vec<Vec<(String, String)>> = rows
        .iter()
        .map(|row| {
            let mut cells = Vec::new();
            match row {
                Value::Object(map) => flatten_into("", map, &mut cells),
                other => cells.push(("value".to_string(), cell(other))),
            }
            cells
        })
        .collect();

    let mut headers: Vec<String> = Vec::new();
    for cells in &flattened {
        for (column, _) in cells {
            if !headers.contains(column) {
                headers.push(column.clone());
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    if !headers.is_empty() {
        writer.write_record(&headers)?;
    }
    for cells in &flattened {
        let record: Vec<&str> = headers
            .iter()
            .map(|column| {
                cells
                    .iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, value)| value.as_str())
                    .unwrap_or("")
            })
            .collect();
        writer.write_record(&record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) => flatten_into(&column, inner, out),
            other => out.push((column, cell(other))),
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => {
            items.iter().map(cell).collect::<Vec<_>>().join("; ")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flattens_nested_objects() {
        let rows = vec![
            json!({"name": "Amina", "profile": {"location": {"city": "Hargeisa"}}, "skills": ["go", "rust"]}),
            json!({"name": "Bile", "phone": "+252 63 1234567"}),
        ];
        let csv = to_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,profile.location.city,skills,phone"));
        assert_eq!(lines.next(), Some("Amina,Hargeisa,go; rust,"));
        assert_eq!(lines.next(), Some("Bile,,,+252 63 1234567"));
    }

    #[test]
    fn test_quotes_embedded_commas() {
        let csv = to_csv(&[json!({"title": "Gala, 2025"})]).unwrap();
        assert!(csv.contains("\"Gala, 2025\""));
    }

    #[test]
    fn test_empty_rows() {
        assert_eq!(to_csv(&[]).unwrap(), "");
    }
}
