use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name sent when the respondent left the name column blank.
pub const FALLBACK_NAME: &str = "No Name";

/// Trigger event delivered once per form response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionEvent {
    /// Raw row values, one per form column.
    #[serde(default)]
    pub values: Option<Vec<Value>>,
}

impl SubmissionEvent {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: Some(values),
        }
    }

    pub fn values(&self) -> Option<&[Value]> {
        self.values.as_deref()
    }
}

/// Which columns of the response row go where in the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FormLayout {
    pub timestamp_index: usize,
    pub name_index: usize,
    pub answer_indices: Vec<usize>,
}

impl Default for FormLayout {
    fn default() -> Self {
        Self {
            timestamp_index: 0,
            name_index: 1,
            answer_indices: vec![6, 7, 8, 9, 10, 15, 16, 17],
        }
    }
}

/// Body POSTed to the target endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    /// Absent when the row is shorter than the timestamp column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    pub name: Value,
    pub answers: Vec<Value>,
}

impl FormLayout {
    pub fn build_payload(&self, values: &[Value]) -> Payload {
        let name = match values.get(self.name_index) {
            Some(v) if !is_falsy(v) => v.clone(),
            _ => Value::String(FALLBACK_NAME.to_string()),
        };

        Payload {
            timestamp: values.get(self.timestamp_index).cloned(),
            name,
            answers: self
                .answer_indices
                .iter()
                .map(|&i| values.get(i).cloned().unwrap_or(Value::Null))
                .collect(),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}
