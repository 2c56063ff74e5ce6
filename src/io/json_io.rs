use std::path::Path;

use crate::error::EfiscenError;
use crate::models::Experiment;

/// Read a recorded experiment from a JSON file.
pub fn read_json(path: impl AsRef<Path>) -> Result<Experiment, EfiscenError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let experiment: Experiment = serde_json::from_str(&content)?;
    experiment.validate()?;
    Ok(experiment)
}

/// Read a recorded experiment from JSON bytes.
pub fn read_json_from_bytes(data: &[u8], name: &str) -> Result<Experiment, EfiscenError> {
    let content = std::str::from_utf8(data)
        .map_err(|e| EfiscenError::ParseError(format!("Invalid UTF-8: {e}")))?;
    let mut experiment: Experiment = serde_json::from_str(content)?;
    experiment.validate()?;
    experiment.name = name.to_string();
    Ok(experiment)
}

/// Write an experiment to a JSON file.
pub fn write_json(
    experiment: &Experiment,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), EfiscenError> {
    let content = if pretty {
        serde_json::to_string_pretty(experiment)?
    } else {
        serde_json::to_string(experiment)?
    };
    std::fs::write(path.as_ref(), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Stratum, StratumKey};

    fn sample() -> Experiment {
        let mut exp = Experiment::new("json", 1990, 5);
        let stratum = Stratum {
            area: vec![[1.0; 16], [2.0; 16]].into(),
            increment: vec![3.5, 4.0].into(),
            ..Default::default()
        };
        exp.strata.insert(StratumKey::pack(1, 2, 3, 4), stratum);
        exp
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exp.json");
        write_json(&sample(), &path, true).unwrap();
        let loaded = read_json(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_keys_are_packed_integers() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"16909060\""));
    }

    #[test]
    fn test_short_age_class_vector_rejected() {
        let json = r#"{"name":"x","base_year":2000,"step_length":5,
            "strata":{"16908548":{"area":[[1.0,2.0]]}}}"#;
        assert!(read_json_from_bytes(json.as_bytes(), "x").is_err());
    }

    #[test]
    fn test_zero_field_key_rejected() {
        // region 1, owner 0, site 1, species 1
        let json = r#"{"name":"x","base_year":2000,"step_length":5,
            "strata":{"16777473":{}}}"#;
        let err = read_json_from_bytes(json.as_bytes(), "x").unwrap_err();
        assert!(matches!(err, EfiscenError::ValidationError(_)));
    }

    #[test]
    fn test_region_beyond_32_bits_rejected() {
        // same low 32 region bits as R1/O1/S1/Sp1, plus bit 56
        let json = r#"{"name":"x","base_year":2000,"step_length":5,
            "strata":{"16843009":{},"72057594054770945":{}}}"#;
        let err = read_json_from_bytes(json.as_bytes(), "x").unwrap_err();
        assert!(err.to_string().contains("beyond 32 bits"), "{err}");
    }

    #[test]
    fn test_ragged_series_rejected() {
        let json = r#"{"name":"x","base_year":2000,"step_length":5,
            "strata":{"16843009":{"increment":[1.0,2.0],"soil":{"nwl":[1.0]}}}}"#;
        let err = read_json_from_bytes(json.as_bytes(), "x").unwrap_err();
        assert!(matches!(err, EfiscenError::ValidationError(_)));
    }

    #[test]
    fn test_bytes_override_name() {
        let json = serde_json::to_vec(&sample()).unwrap();
        let exp = read_json_from_bytes(&json, "renamed").unwrap();
        assert_eq!(exp.name, "renamed");
        assert_eq!(exp.num_strata(), 1);
    }
}
