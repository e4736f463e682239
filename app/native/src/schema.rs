//! JSON Schema for the configuration file.

use schemars::schema_for;

use crate::config::DaywallConfig;

/// Pretty-printed JSON Schema describing `DaywallConfig`.
#[must_use]
pub fn print_schema() -> String {
    let schema = schema_for!(DaywallConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(&print_schema()).unwrap();
        assert_eq!(value["title"], "DaywallConfig");
    }

    #[test]
    fn test_schema_lists_sections_in_camel_case() {
        let value: serde_json::Value = serde_json::from_str(&print_schema()).unwrap();
        let properties = value["properties"].as_object().unwrap();
        let sections = [
            "generator",
            "credentials",
            "retry",
            "download",
            "fallback",
            "storage",
            "schedule",
            "wallpaper",
        ];
        for key in sections {
            assert!(properties.contains_key(key), "missing {key}");
        }
    }
}
