//! Contact record returned by the extraction collaborator

use crate::llm::ToolDefinition;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// Name of the forced extraction function
pub const EXTRACTION_TOOL: &str = "extract_info";

/// Field names in schema order
pub const FIELD_NAMES: [&str; 5] = ["name", "email", "phone", "location", "age"];

/// Age as reported by the model: an integer, or anything else it produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgeValue {
    Integer(i64),
    Other(Value),
}

impl AgeValue {
    /// Zero, false, null and empty values read as absent in reports
    pub fn is_blank(&self) -> bool {
        match self {
            AgeValue::Integer(n) => *n == 0,
            AgeValue::Other(Value::Null) | AgeValue::Other(Value::Bool(false)) => true,
            AgeValue::Other(Value::Number(n)) => n.as_f64() == Some(0.0),
            AgeValue::Other(Value::String(s)) => s.is_empty(),
            AgeValue::Other(Value::Array(a)) => a.is_empty(),
            AgeValue::Other(Value::Object(o)) => o.is_empty(),
            AgeValue::Other(_) => false,
        }
    }
}

/// Five nullable fields extracted from free text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default)]
    pub age: Option<AgeValue>,
}

impl ContactRecord {
    /// Number of non-null fields
    pub fn extracted_count(&self) -> usize {
        self.fields().iter().filter(|(_, value)| value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.extracted_count() == 0
    }

    /// `(field, display value)` pairs in schema order
    pub fn fields(&self) -> [(&'static str, Option<String>); 5] {
        let age = self.age.as_ref().map(|age| match age {
            AgeValue::Integer(n) => n.to_string(),
            AgeValue::Other(Value::String(s)) => s.clone(),
            AgeValue::Other(other) => other.to_string(),
        });

        [
            (FIELD_NAMES[0], self.name.clone()),
            (FIELD_NAMES[1], self.email.clone()),
            (FIELD_NAMES[2], self.phone.clone()),
            (FIELD_NAMES[3], self.location.clone()),
            (FIELD_NAMES[4], age),
        ]
    }

    /// Like [`fields`](Self::fields), but empty strings and a blank age
    /// count as not found
    pub fn reported_fields(&self) -> [(&'static str, Option<String>); 5] {
        let mut fields = self.fields();
        for (name, value) in fields.iter_mut() {
            let blank = match *name {
                "age" => self.age.as_ref().map_or(true, AgeValue::is_blank),
                _ => value.as_deref().map_or(true, str::is_empty),
            };
            if blank {
                *value = None;
            }
        }
        fields
    }
}

/// JSON schema for the extraction function parameters
pub fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": ["string", "null"]},
            "email": {"type": ["string", "null"]},
            "phone": {"type": ["string", "null"]},
            "location": {"type": ["string", "null"]},
            "age": {"type": ["integer", "null"]}
        }
    })
}

pub fn extraction_tool() -> ToolDefinition {
    ToolDefinition::function(EXTRACTION_TOOL, extraction_schema())
}

// Models occasionally emit numbers for phone-like fields.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_partial_record() {
        let record: ContactRecord = serde_json::from_value(json!({
            "name": "Mike",
            "email": "mike@tech.io",
            "phone": null,
            "location": "Seattle",
            "age": null
        }))
        .unwrap();

        assert_eq!(record.name.as_deref(), Some("Mike"));
        assert!(record.phone.is_none());
        assert!(record.age.is_none());
        assert_eq!(record.extracted_count(), 3);
    }

    #[test]
    fn test_missing_fields_default_to_null() {
        let record: ContactRecord = serde_json::from_value(json!({"name": "Sarah"})).unwrap();
        assert_eq!(record.extracted_count(), 1);
        assert!(record.email.is_none());
    }

    #[test]
    fn test_age_variants() {
        let integer: ContactRecord = serde_json::from_value(json!({"age": 28})).unwrap();
        assert_eq!(integer.age, Some(AgeValue::Integer(28)));

        let text: ContactRecord = serde_json::from_value(json!({"age": "twenty"})).unwrap();
        assert_eq!(text.age, Some(AgeValue::Other(json!("twenty"))));

        let fractional: ContactRecord = serde_json::from_value(json!({"age": 28.5})).unwrap();
        assert!(matches!(fractional.age, Some(AgeValue::Other(_))));
    }

    #[test]
    fn test_numeric_phone_is_stringified() {
        let record: ContactRecord = serde_json::from_value(json!({"phone": 5551234567u64})).unwrap();
        assert_eq!(record.phone.as_deref(), Some("5551234567"));
    }

    #[test]
    fn test_default_is_all_null() {
        let record = ContactRecord::default();
        assert!(record.is_empty());
        assert!(record.fields().iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn test_reported_fields_hide_blank_values() {
        let record: ContactRecord =
            serde_json::from_value(json!({"name": "Ana", "email": "", "age": 0})).unwrap();

        assert_eq!(record.extracted_count(), 3);
        let reported = record.reported_fields();
        assert_eq!(reported[0], ("name", Some("Ana".to_string())));
        assert_eq!(reported[1], ("email", None));
        assert_eq!(reported[4], ("age", None));

        let adult: ContactRecord = serde_json::from_value(json!({"age": 41})).unwrap();
        assert_eq!(adult.reported_fields()[4], ("age", Some("41".to_string())));
    }

    #[test]
    fn test_tool_definition() {
        let tool = extraction_tool();
        assert_eq!(tool.name(), "extract_info");
        assert_eq!(
            tool.function.parameters["properties"]["age"]["type"],
            json!(["integer", "null"])
        );
    }
}
