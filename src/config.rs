use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::MetasheetError;
use crate::sheets::SheetNameConfig;

pub const DEFAULT_CONFIG_FILE: &str = "metasheet.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub sheet_names: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub strict_sheet_names: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Utf8PathBuf,
    pub sheet_names: SheetNameConfig,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and resolve the config file. Without an explicit path, a missing
    /// `metasheet.json` in the current directory falls back to defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, MetasheetError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| MetasheetError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| MetasheetError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, MetasheetError> {
        let sheet_names = SheetNameConfig {
            sheet_names: config.sheet_names.unwrap_or_else(default_sheet_names),
            strict: config.strict_sheet_names,
        };
        sheet_names.validate()?;

        Ok(ResolvedConfig {
            host: config.host.unwrap_or_else(|| "0.0.0.0".to_string()),
            port: config.port.unwrap_or(8080),
            data_dir: Utf8PathBuf::from(
                config.data_dir.unwrap_or_else(|| ".metasheet".to_string()),
            ),
            sheet_names,
        })
    }
}

/// Display names for the well-known metadata properties.
pub fn default_sheet_names() -> BTreeMap<String, String> {
    [
        ("studies", "Study"),
        ("samples", "Sample"),
        ("analyses", "Analysis"),
        ("individuals", "Individual"),
        ("experiments", "Experiment"),
        ("datasets", "Dataset"),
        ("publications", "Publication"),
    ]
    .into_iter()
    .map(|(name, display)| (name.to_string(), display.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn resolve_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.host, "0.0.0.0");
        assert_eq!(resolved.port, 8080);
        assert_eq!(resolved.data_dir, Utf8PathBuf::from(".metasheet"));
        assert_eq!(
            resolved.sheet_names.sheet_names.get("samples").unwrap(),
            "Sample"
        );
        assert!(!resolved.sheet_names.strict);
    }

    #[test]
    fn over_long_sheet_name_is_rejected() {
        let config = Config {
            sheet_names: Some(BTreeMap::from([(
                "test".to_string(),
                "A long sheet name".repeat(10),
            )])),
            ..Config::default()
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, MetasheetError::SheetNameTooLong { .. });
    }
}
