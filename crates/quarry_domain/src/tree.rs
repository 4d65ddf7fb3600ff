use serde::{Deserialize, Serialize};

/// Query tree as produced by the editor. Stored, restored and compared, never inspected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializedTree(pub serde_json::Value);

impl SerializedTree {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }
}

/// Parses a cached tree. Anything that is not a JSON object counts as a miss.
pub fn parse_cached_tree(raw: &str) -> Option<SerializedTree> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value @ serde_json::Value::Object(_)) => Some(SerializedTree(value)),
        Ok(_) => None,
        Err(_) => None,
    }
}
