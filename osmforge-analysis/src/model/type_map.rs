//! Logical → physical type mapping.
//!
//! Observed on-disk types win over the mapping: the emitted schema must
//! round-trip what the database actually has.

use super::types::Attribute;

/// Physical T-SQL type for an attribute.
pub fn physical_type_for(attribute: &Attribute) -> String {
    if let Some(observed) = attribute.observed_type.as_deref() {
        if !observed.trim().is_empty() {
            return observed.trim().to_string();
        }
    }
    map_logical_type(&attribute.data_type, attribute.length)
}

/// Map a logical data type name to its T-SQL representation.
pub fn map_logical_type(data_type: &str, length: Option<u32>) -> String {
    match data_type.to_ascii_lowercase().as_str() {
        "identifier" | "integer" => "INT".to_string(),
        "long integer" | "longinteger" => "BIGINT".to_string(),
        "decimal" | "currency" => "DECIMAL(37,8)".to_string(),
        "boolean" => "BIT".to_string(),
        "date" => "DATE".to_string(),
        "time" => "TIME".to_string(),
        "datetime" | "date time" => "DATETIME".to_string(),
        "binarydata" | "binary data" | "binary" => "VARBINARY(MAX)".to_string(),
        "guid" => "UNIQUEIDENTIFIER".to_string(),
        "text" | "email" | "phone" | "phone number" | "url" => match length {
            Some(0) => "NVARCHAR(MAX)".to_string(),
            Some(n) if n > 4000 => "NVARCHAR(MAX)".to_string(),
            Some(n) => format!("NVARCHAR({n})"),
            None => "NVARCHAR(50)".to_string(),
        },
        other => {
            // Unknown logical types pass through; the validator will flag
            // anything the target cannot parse.
            tracing::debug!(data_type = other, "passing through unmapped logical type");
            data_type.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_maps_by_length() {
        assert_eq!(map_logical_type("Text", Some(250)), "NVARCHAR(250)");
        assert_eq!(map_logical_type("Text", Some(0)), "NVARCHAR(MAX)");
        assert_eq!(map_logical_type("Text", None), "NVARCHAR(50)");
        assert_eq!(map_logical_type("Text", Some(8000)), "NVARCHAR(MAX)");
    }

    #[test]
    fn scalar_types_map_directly() {
        assert_eq!(map_logical_type("Identifier", None), "INT");
        assert_eq!(map_logical_type("Long Integer", None), "BIGINT");
        assert_eq!(map_logical_type("Boolean", None), "BIT");
        assert_eq!(map_logical_type("DateTime", None), "DATETIME");
    }
}
