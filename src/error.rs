use thiserror::Error;

/// Errors that can occur while aggregating or exporting simulation output.
#[derive(Error, Debug)]
pub enum EfiscenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// An age-class array handed to a table writer did not have 16 buckets.
    #[error("{table}: age-class array '{array}' has {len} elements, expected 16")]
    AgeClassLength {
        table: &'static str,
        array: &'static str,
        len: usize,
    },

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Export session aborted: {0}")]
    SessionAborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = EfiscenError::from(io_err);
        let msg = err.to_string();
        assert!(msg.contains("IO error"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_age_class_length_display_names_table_and_array() {
        let err = EfiscenError::AgeClassLength {
            table: "Base",
            array: "area",
            len: 15,
        };
        assert_eq!(
            err.to_string(),
            "Base: age-class array 'area' has 15 elements, expected 16"
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = EfiscenError::ParseError("bad line".to_string());
        assert_eq!(err.to_string(), "Parse error: bad line");
    }

    #[test]
    fn test_session_aborted_display() {
        let err = EfiscenError::SessionAborted("no simulation id".to_string());
        assert_eq!(err.to_string(), "Export session aborted: no simulation id");
    }

    #[test]
    fn test_json_error_from_conversion() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("not valid json{{{");
        let json_err = result.unwrap_err();
        let err: EfiscenError = json_err.into();
        assert!(matches!(err, EfiscenError::Json(_)));
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_toml_error_from_conversion() {
        let result: Result<toml::Value, _> = toml::from_str("= nope");
        let err: EfiscenError = result.unwrap_err().into();
        assert!(matches!(err, EfiscenError::Config(_)));
    }

    #[test]
    fn test_error_is_debug() {
        let err = EfiscenError::DuplicateKey("matrix".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("DuplicateKey"));
    }
}
