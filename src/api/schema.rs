//! Column resolution for SimFin's self-describing responses.
//!
//! Every response carries its own `columns` header array, and the provider
//! does not guarantee column order or presence across calls or statement
//! kinds. Required logical names are therefore resolved to positions on
//! every response, never cached.

use serde_json::Value;
use thiserror::Error;

/// Expected column missing from a response header
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("expected column '{0}' not found in API response")]
    MissingColumn(String),
}

/// Resolve each required logical column name to its position in `headers`.
///
/// Lookup is exact and case-sensitive. The returned indices are parallel to
/// `required`. Any missing name rejects the whole response; a statement
/// with an unexpected layout is never partially parsed.
pub fn resolve_columns(headers: &[Value], required: &[&str]) -> Result<Vec<usize>, SchemaError> {
    // Positions must index the original array, so non-string headers stay in place
    let names: Vec<Option<&str>> = headers.iter().map(|v| v.as_str()).collect();

    required
        .iter()
        .map(|name| {
            names
                .iter()
                .position(|header| *header == Some(*name))
                .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<Value> {
        names.iter().map(|n| json!(n)).collect()
    }

    #[test]
    fn test_resolves_columns_in_required_order() {
        let cols = headers(&["Fiscal Year", "Report Date", "Revenue"]);
        let indices = resolve_columns(&cols, &["Report Date", "Revenue", "Fiscal Year"]).unwrap();
        assert_eq!(indices, vec![1, 2, 0]);
    }

    #[test]
    fn test_missing_column_rejects_whole_response() {
        let cols = headers(&["Date", "Open Price"]);
        let err = resolve_columns(&cols, &["Date", "Last Closing Price"]).unwrap_err();
        assert_eq!(err, SchemaError::MissingColumn("Last Closing Price".to_string()));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let cols = headers(&["date"]);
        assert!(resolve_columns(&cols, &["Date"]).is_err());
    }

    #[test]
    fn test_non_string_headers_keep_their_position() {
        let cols = vec![json!(42), json!("Date")];
        let indices = resolve_columns(&cols, &["Date"]).unwrap();
        assert_eq!(indices, vec![1]);
    }
}
