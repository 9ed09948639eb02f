use crate::Document;
use serde_json::Value;

/// Conjunction of field equality conditions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter without conditions matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq<K, V>(mut self, field: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_matches() {
        let berlin = doc(json!({"_id": "1", "name": "Berlin", "version": "a"}));

        assert!(Filter::new().matches(&berlin));
        assert!(Filter::new().eq("_id", "1").matches(&berlin));
        assert!(Filter::new().eq("_id", "1").eq("version", "a").matches(&berlin));

        // Every condition has to hold
        assert!(!Filter::new().eq("_id", "1").eq("version", "b").matches(&berlin));

        // Missing fields never match
        assert!(!Filter::new().eq("latitude", 1.0).matches(&berlin));
    }
}
