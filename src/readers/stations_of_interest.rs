use crate::error::{ProcessingError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Load the station allow-list: a JSON array of station identifiers.
///
/// Numeric entries are accepted and stringified; anything that is not a
/// list, or a list entry that is neither string nor number, is rejected.
pub fn read_stations_of_interest(path: &Path) -> Result<Vec<String>> {
    info!("Loading stations of interest from {}", path.display());

    if !path.exists() {
        return Err(ProcessingError::missing_file(
            path,
            "Please create this file with a JSON list of station short_name IDs.",
        ));
    }

    let contents = fs::read_to_string(path)?;
    let stations = parse_stations_of_interest(&contents)?;

    info!("Loaded {} stations of interest", stations.len());
    Ok(stations)
}

pub fn parse_stations_of_interest(contents: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(contents).map_err(|e| {
        ProcessingError::InvalidFormat(format!("stations_of_interest file is not valid JSON: {}", e))
    })?;

    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(ProcessingError::InvalidFormat(format!(
                "stations_of_interest file must contain a JSON list, got {}",
                json_type_name(&other)
            )))
        }
    };

    entries
        .into_iter()
        .map(|entry| match entry {
            Value::String(id) => Ok(id),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(ProcessingError::InvalidFormat(format!(
                "stations_of_interest entries must be station ids, got {}",
                json_type_name(&other)
            ))),
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_of_ids() {
        let stations = parse_stations_of_interest(r#"["M32006", "A32000", 67]"#).unwrap();
        assert_eq!(stations, vec!["M32006", "A32000", "67"]);
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_stations_of_interest("[]").unwrap().is_empty());
    }

    #[test]
    fn test_reject_object() {
        let result = parse_stations_of_interest(r#"{"stations": ["M32006"]}"#);
        match result {
            Err(ProcessingError::InvalidFormat(msg)) => assert!(msg.contains("object")),
            other => panic!("expected InvalidFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_reject_nested_entries() {
        let result = parse_stations_of_interest(r#"["M32006", ["A32000"]]"#);
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = parse_stations_of_interest("[\"M32006\"");
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }
}
