use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MetasheetError;

/// Excel rejects worksheet names longer than this.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Mapping from internal property names to worksheet display names.
///
/// With `strict` set, an unconfigured property is an error; otherwise the
/// property name itself is used, truncated to the 31-character limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetNameConfig {
    #[serde(default)]
    pub sheet_names: BTreeMap<String, String>,
    #[serde(default)]
    pub strict: bool,
}

impl SheetNameConfig {
    /// Check that every configured display name fits the Excel limit.
    /// Called once at configuration load, not per transpilation.
    pub fn validate(&self) -> Result<(), MetasheetError> {
        for (name, display) in &self.sheet_names {
            if display.chars().count() > MAX_SHEET_NAME_LEN {
                return Err(MetasheetError::SheetNameTooLong {
                    name: name.clone(),
                    display: display.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn translate(&self, name: &str) -> Result<String, MetasheetError> {
        if let Some(display) = self.sheet_names.get(name) {
            return Ok(display.clone());
        }
        if self.strict {
            return Err(MetasheetError::SheetNaming(name.to_string()));
        }
        Ok(name.chars().take(MAX_SHEET_NAME_LEN).collect())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config() -> SheetNameConfig {
        SheetNameConfig {
            sheet_names: BTreeMap::from([("analyses".to_string(), "Analysis".to_string())]),
            strict: false,
        }
    }

    #[test]
    fn configured_name_wins() {
        assert_eq!(config().translate("analyses").unwrap(), "Analysis");
    }

    #[test]
    fn unconfigured_name_falls_back_to_identity() {
        assert_eq!(config().translate("bald_knobber").unwrap(), "bald_knobber");
    }

    #[test]
    fn unconfigured_long_name_is_truncated() {
        let long_name = "this_is_a_very_long_name_if_you_are_excel";
        assert_eq!(
            config().translate(long_name).unwrap(),
            &long_name[..MAX_SHEET_NAME_LEN]
        );
    }

    #[test]
    fn strict_mode_rejects_unconfigured_names() {
        let config = SheetNameConfig {
            strict: true,
            ..config()
        };
        assert_eq!(config.translate("analyses").unwrap(), "Analysis");
        let err = config.translate("bald_knobber").unwrap_err();
        assert_matches!(err, MetasheetError::SheetNaming(name) if name == "bald_knobber");
    }

    #[test]
    fn over_long_display_name_fails_validation() {
        let config = SheetNameConfig {
            sheet_names: BTreeMap::from([(
                "test".to_string(),
                "A long sheet name".repeat(10),
            )]),
            strict: false,
        };
        let err = config.validate().unwrap_err();
        assert_matches!(err, MetasheetError::SheetNameTooLong { name, .. } if name == "test");
    }
}
