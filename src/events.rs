use serde_json::Value;
use tracing::debug;

/// The shape of the `canData` field, resolved once at the request boundary.
/// Downstream code only ever sees an ordered list of raw lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanDataPayload {
    Single(String),
    Batch(Vec<String>),
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Bad Request, missing body in event")]
    MissingBody,
    #[error("Invalid JSON format in request body")]
    InvalidBody(#[source] serde_json::Error),
    #[error("Bad Request, canData must be a string or a list of strings")]
    InvalidShape,
    #[error("Invalid data: all canData items must be strings")]
    NonStringItem,
}

impl CanDataPayload {
    /// Resolves a request body into a payload. The typed deserializer cannot
    /// tell a syntax error from a shape error, so the body goes through
    /// [Value] first and the `canData` shape is checked by hand.
    pub fn from_body(body: Option<&str>) -> Result<CanDataPayload, PayloadError> {
        let body = match body {
            Some(body) if !body.is_empty() => body,
            _ => return Err(PayloadError::MissingBody),
        };

        let raw_value: Value = serde_json::from_str(body).map_err(PayloadError::InvalidBody)?;
        debug!("raw_value: {:?}", raw_value);

        match raw_value.get("canData") {
            Some(Value::String(line)) => Ok(CanDataPayload::Single(line.clone())),
            Some(Value::Array(items)) => {
                let mut lines = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(line) => lines.push(line.clone()),
                        _ => return Err(PayloadError::NonStringItem),
                    }
                }
                Ok(CanDataPayload::Batch(lines))
            }
            _ => Err(PayloadError::InvalidShape),
        }
    }

    /// The raw lines in request order. A single string is a one-element batch.
    pub fn into_lines(self) -> Vec<String> {
        match self {
            CanDataPayload::Single(line) => vec![line],
            CanDataPayload::Batch(lines) => lines,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_single_string_is_one_element_batch() {
        let single = CanDataPayload::from_body(Some(r#"{"canData": "(1.0) can0 1#AA"}"#)).unwrap();
        let batch = CanDataPayload::from_body(Some(r#"{"canData": ["(1.0) can0 1#AA"]}"#)).unwrap();
        assert_eq!(single.into_lines(), batch.into_lines());
    }

    #[test]
    fn test_batch_preserves_order() {
        let payload =
            CanDataPayload::from_body(Some(r#"{"canData": ["c", "a", "b"]}"#)).unwrap();
        assert_eq!(payload.into_lines(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_missing_body() {
        assert!(matches!(
            CanDataPayload::from_body(None),
            Err(PayloadError::MissingBody)
        ));
        assert!(matches!(
            CanDataPayload::from_body(Some("")),
            Err(PayloadError::MissingBody)
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            CanDataPayload::from_body(Some("{not json")),
            Err(PayloadError::InvalidBody(_))
        ));
    }

    #[test]
    fn test_wrong_shapes() {
        for body in [
            r#"{"canData": 42}"#,
            r#"{"canData": {"nested": true}}"#,
            r#"{"canData": null}"#,
            r#"{"other": "field"}"#,
            r#"[1, 2, 3]"#,
        ] {
            assert!(
                matches!(
                    CanDataPayload::from_body(Some(body)),
                    Err(PayloadError::InvalidShape)
                ),
                "body: {}",
                body
            );
        }
    }

    #[test]
    fn test_mixed_list_is_rejected() {
        assert!(matches!(
            CanDataPayload::from_body(Some(r#"{"canData": ["(1.0) can0 1#AA", 7]}"#)),
            Err(PayloadError::NonStringItem)
        ));
    }

    #[test]
    fn test_error_messages_are_the_wire_contract() {
        assert_eq!(
            PayloadError::MissingBody.to_string(),
            "Bad Request, missing body in event"
        );
        assert_eq!(
            PayloadError::InvalidShape.to_string(),
            "Bad Request, canData must be a string or a list of strings"
        );
    }
}
