//! JSONB metadata column helpers.

use domain::models::InviteMetadata;
use serde_json::Value;

/// Rows written by this crate always hold an object; anything else reads as empty.
pub fn metadata_from_json(value: Value) -> InviteMetadata {
    match value {
        Value::Object(map) => map,
        _ => InviteMetadata::new(),
    }
}

pub fn metadata_to_json(metadata: &InviteMetadata) -> Value {
    Value::Object(metadata.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_reads_as_empty() {
        assert!(metadata_from_json(json!(null)).is_empty());
        assert!(metadata_from_json(json!([1, 2])).is_empty());
        assert_eq!(metadata_from_json(json!({"venue_id": "v-1"}))["venue_id"], "v-1");
    }
}
