use serde::Deserialize;

use crate::error::MappingError;

/// Mapper settings, parsed from TOML or built in code.
///
/// ```toml
/// numeric_widening = false
/// cache_descriptors = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapperConfig {
    /// Also accept lossless numeric widening (`int16 → int32 → int64`,
    /// `float32 → float64`) when matching columns to parameters.
    #[serde(default)]
    pub numeric_widening: bool,

    /// Keep resolved type descriptors for the lifetime of the mapper.
    #[serde(default = "default_cache_descriptors")]
    pub cache_descriptors: bool,
}

fn default_cache_descriptors() -> bool {
    true
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            numeric_widening: false,
            cache_descriptors: default_cache_descriptors(),
        }
    }
}

impl MapperConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, MappingError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MappingError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, MappingError> {
        toml::from_str(toml_str).map_err(|e| MappingError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = MapperConfig::parse("").unwrap();
        assert_eq!(cfg, MapperConfig::default());
        assert!(!cfg.numeric_widening);
        assert!(cfg.cache_descriptors);
    }

    #[test]
    fn parses_all_fields() {
        let cfg = MapperConfig::parse("numeric_widening = true\ncache_descriptors = false\n").unwrap();
        assert!(cfg.numeric_widening);
        assert!(!cfg.cache_descriptors);
    }

    #[test]
    fn unknown_key_is_config_error() {
        let err = MapperConfig::parse("widening = true").unwrap_err();
        assert!(matches!(err, MappingError::Config(_)));
    }

    #[test]
    fn load_reads_file_and_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "numeric_widening = true").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        assert!(MapperConfig::load(&path).unwrap().numeric_widening);

        let missing = MapperConfig::load("/nonexistent/mapper.toml").unwrap_err();
        assert!(missing.to_string().contains("/nonexistent/mapper.toml"));
    }
}
