//! Descriptive report metadata supplied by the remote side.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub filename: Option<String>,
    pub city: Option<String>,
    pub report_type: Option<String>,
    pub created_time: Option<String>,
    /// Size in bytes
    pub file_size: Option<u64>,
}

impl ReportMetadata {
    /// Read whichever known fields are present in a JSON object.
    ///
    /// `file_size` is accepted as a number or a numeric string.
    pub fn from_json(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
        };

        let file_size = value.get("file_size").and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        Self {
            filename: text("filename"),
            city: text("city"),
            report_type: text("report_type"),
            created_time: text("created_time"),
            file_size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let meta = ReportMetadata::from_json(&json!({
            "filename": "territory_report_jeddah.md",
            "city": "Jeddah",
            "created_time": "2025-01-01 10:00:00",
            "file_size": "2048",
            "content": "ignored"
        }));
        assert_eq!(meta.filename.as_deref(), Some("territory_report_jeddah.md"));
        assert_eq!(meta.city.as_deref(), Some("Jeddah"));
        assert_eq!(meta.report_type, None);
        assert_eq!(meta.file_size, Some(2048));
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_from_non_object() {
        assert!(ReportMetadata::from_json(&json!("just text")).is_empty());
        assert!(ReportMetadata::from_json(&json!({"file_size": -3})).is_empty());
    }
}
