use thiserror::Error;

/// Record encode/decode errors. None of these are retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("{field} is {len} bytes, maximum is {max}")]
    FieldTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("truncated input: needed {needed} bytes, got {got}")]
    TruncatedInput { needed: usize, got: usize },

    #[error("malformed {field}: {reason}")]
    MalformedField { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_field_too_large() {
        let err = RecordError::FieldTooLarge {
            field: "uri",
            len: 44,
            max: 43,
        };
        assert_eq!(err.to_string(), "uri is 44 bytes, maximum is 43");
    }

    #[test]
    fn display_truncated_input() {
        let err = RecordError::TruncatedInput { needed: 4, got: 2 };
        assert_eq!(err.to_string(), "truncated input: needed 4 bytes, got 2");
    }

    #[test]
    fn display_malformed_field() {
        let err = RecordError::MalformedField {
            field: "uri",
            reason: "not UTF-8".into(),
        };
        assert_eq!(err.to_string(), "malformed uri: not UTF-8");
    }
}
