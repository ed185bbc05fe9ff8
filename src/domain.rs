use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MetasheetError;

/// Unique identifier of a study, used as the key in both stores and as a
/// filename component by the filesystem adapters. Deserialization goes
/// through the same validation as parsing, so a decoded document cannot
/// carry an accession that parsing would reject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct StudyAccession(String);

impl StudyAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudyAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for StudyAccession {
    type Error = MetasheetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for StudyAccession {
    type Err = MetasheetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid = !normalized.is_empty()
            && normalized != "."
            && normalized != ".."
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
        if !is_valid {
            return Err(MetasheetError::InvalidAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// A metadata artifact keyed by study accession.
///
/// `content` maps property names ("samples", "studies", ...) to a sequence of
/// rows, each row an object mapping column names to arbitrary JSON values.
/// Property and column order is preserved as received (`serde_json` with
/// `preserve_order`), so derived workbooks are deterministic for a given
/// document. Equality is deep equality over the whole document; the upsert
/// path relies on it to detect unchanged content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyMetadata {
    pub study_accession: StudyAccession,
    pub content: Map<String, Value>,
}
